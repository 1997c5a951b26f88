//! Measurement overlay text
//!
//! Formats the measurement band shown above the waveform viewport and
//! defines the rasterizer seam. Font rendering itself lives behind
//! [`TextRasterizer`] so the compositor stays independent of any
//! particular glyph source.

use crate::acquire::stats::Measurement;
use crate::render::canvas::WaveformCanvas;
use crate::render::display::{GREEN, WHITE};
use crate::{SAMPLE_MAX, VREF_VOLTS};

/// Draws text strings into a canvas at pixel positions
pub trait TextRasterizer: Send {
    /// Draw `text` with its top-left corner at (x, y) in palette `color`
    fn draw_text(&mut self, canvas: &mut WaveformCanvas, x: usize, y: usize, text: &str, color: u8);
}

/// Rasterizer that draws nothing; for headless runs
pub struct NullText;

impl TextRasterizer for NullText {
    fn draw_text(
        &mut self,
        _canvas: &mut WaveformCanvas,
        _x: usize,
        _y: usize,
        _text: &str,
        _color: u8,
    ) {
    }
}

/// Records every draw call instead of rasterizing, for tests
#[derive(Default)]
pub struct RecordingText {
    pub calls: Vec<(usize, usize, String, u8)>,
}

impl TextRasterizer for RecordingText {
    fn draw_text(
        &mut self,
        _canvas: &mut WaveformCanvas,
        x: usize,
        y: usize,
        text: &str,
        color: u8,
    ) {
        self.calls.push((x, y, text.to_string(), color));
    }
}

/// One line of the measurement band
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub x: usize,
    pub y: usize,
    pub text: String,
    pub color: u8,
}

/// Convert a raw 12-bit sample to volts against the ADC reference
pub fn sample_to_volts(sample: u16) -> f64 {
    sample as f64 * VREF_VOLTS / SAMPLE_MAX as f64
}

/// Format a frequency with an adaptive unit
fn format_frequency(hz: f64) -> String {
    if hz >= 1_000_000.0 {
        format!("{:.2} MHz", hz / 1_000_000.0)
    } else if hz >= 1_000.0 {
        format!("{:.2} kHz", hz / 1_000.0)
    } else {
        format!("{:.1} Hz", hz)
    }
}

/// Lay out the measurement band for one measurement.
///
/// Voltage readouts stack at the left edge; frequency and duty cycle sit
/// in a second column.
pub fn measurement_overlay(m: &Measurement) -> Vec<OverlayLine> {
    let mut lines = vec![
        OverlayLine {
            x: 0,
            y: 0,
            text: format!("Vmax: {:.2} V", sample_to_volts(m.max)),
            color: WHITE,
        },
        OverlayLine {
            x: 0,
            y: 10,
            text: format!("Vmin: {:.2} V", sample_to_volts(m.min)),
            color: WHITE,
        },
        OverlayLine {
            x: 0,
            y: 20,
            text: format!("Vpp:  {:.2} V", sample_to_volts(m.vpp)),
            color: WHITE,
        },
    ];

    if m.frequency > 0.0 {
        lines.push(OverlayLine {
            x: 100,
            y: 0,
            text: format!("Freq: {}", format_frequency(m.frequency)),
            color: GREEN,
        });
        lines.push(OverlayLine {
            x: 100,
            y: 10,
            text: format!("Duty: {:.1} %", m.duty_cycle),
            color: GREEN,
        });
    } else {
        lines.push(OverlayLine {
            x: 100,
            y: 0,
            text: "Freq: ---".to_string(),
            color: GREEN,
        });
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_sample_to_volts_endpoints() {
        assert_eq!(sample_to_volts(0), 0.0);
        assert_relative_eq!(sample_to_volts(4095), 3.3);
        assert_relative_eq!(sample_to_volts(2048), 1.65, epsilon = 0.01);
    }

    #[test]
    fn test_overlay_voltage_lines() {
        let m = Measurement {
            min: 0,
            max: 4095,
            vpp: 4095,
            frequency: 15_625.0,
            duty_cycle: 50.0,
        };
        let lines = measurement_overlay(&m);
        assert_eq!(lines[0].text, "Vmax: 3.30 V");
        assert_eq!(lines[0].y, 0);
        assert_eq!(lines[1].text, "Vmin: 0.00 V");
        assert_eq!(lines[1].y, 10);
        assert_eq!(lines[2].text, "Vpp:  3.30 V");
        assert_eq!(lines[2].y, 20);
    }

    #[test]
    fn test_overlay_frequency_units() {
        let mut m = Measurement {
            frequency: 15_625.0,
            duty_cycle: 50.0,
            ..Measurement::no_signal()
        };
        let freq_line = |m: &Measurement| {
            measurement_overlay(m)
                .into_iter()
                .find(|l| l.x == 100 && l.y == 0)
                .unwrap()
                .text
        };
        assert_eq!(freq_line(&m), "Freq: 15.62 kHz");

        m.frequency = 500.0;
        assert_eq!(freq_line(&m), "Freq: 500.0 Hz");

        m.frequency = 2_000_000.0;
        assert_eq!(freq_line(&m), "Freq: 2.00 MHz");
    }

    #[test]
    fn test_no_signal_hides_duty() {
        let lines = measurement_overlay(&Measurement::no_signal());
        assert!(lines.iter().any(|l| l.text == "Freq: ---"));
        assert!(!lines.iter().any(|l| l.text.starts_with("Duty")));
    }
}
