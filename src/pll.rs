/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------
*/

//! Software phase-locked loop recovering a bitstream from raw flux-reversal
//! timings. Each reversal interval is treated as a nominal integer number of
//! bitcells; longer intervals emit zero-bits followed by one reversal bit,
//! with a small proportional correction tracking drift between the nominal
//! and the observed cell period.

use crate::bitbuffer::BitBuffer;
use crate::flux::FluxData;
use crate::sector::DataRate;
use log::trace;

/// Which gain profile to run the loop at. Aggressive suits clean, recently
/// written media; conservative suits old or noisy media where one bad
/// interval should not be allowed to swing the working period far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PllPreset {
    Aggressive,
    Conservative,
}

#[derive(Debug, Clone, Copy)]
struct Gains {
    phase_gain: f64,
    clock_gain: f64,
    max_adjust: f64,
}

impl Gains {
    fn for_preset(preset: PllPreset) -> Self {
        match preset {
            PllPreset::Aggressive => Gains { phase_gain: 0.65, clock_gain: 0.05, max_adjust: 0.15 },
            PllPreset::Conservative => Gains { phase_gain: 0.40, clock_gain: 0.02, max_adjust: 0.10 },
        }
    }
}

/// Running statistics useful for diagnosing flux quality, mirroring the
/// reference PLL's short/medium/long/too-short/too-long transition counts.
#[derive(Debug, Clone, Copy, Default)]
pub struct FluxStats {
    pub short: u32,
    pub medium: u32,
    pub long: u32,
    pub too_short: u32,
    pub too_long: u32,
}

pub struct Pll {
    nominal_period_ns: f64,
    working_period: f64,
    gains: Gains,
    stats: FluxStats,
}

impl Pll {
    pub fn new(data_rate: DataRate) -> Self {
        Self::from_preset(data_rate, PllPreset::Aggressive)
    }

    pub fn from_preset(data_rate: DataRate, preset: PllPreset) -> Self {
        let nominal = data_rate.bitcell_ns() as f64;
        Self { nominal_period_ns: nominal, working_period: nominal, gains: Gains::for_preset(preset), stats: FluxStats::default() }
    }

    pub fn stats(&self) -> FluxStats {
        self.stats
    }

    pub fn working_period_ns(&self) -> f64 {
        self.working_period
    }

    /// Decode an entire [`FluxData`] (all revolutions concatenated) into one
    /// [`BitBuffer`] at `data_rate`. Revolution boundaries do not wrap: the
    /// loop's working period is *not* reset between revolutions, matching
    /// the source's treatment of flux as one continuous logical pass.
    pub fn decode(&mut self, flux: &FluxData, data_rate: DataRate) -> BitBuffer {
        let mut buf = BitBuffer::new(data_rate);
        for revolution in flux.revolutions() {
            for &interval_ns in revolution {
                self.consume_interval(interval_ns as f64, &mut buf);
            }
        }
        buf
    }

    /// Consume one flux interval, appending `(cells - 1)` zero bits followed
    /// by a single reversal bit to `buf`, and nudging the working period
    /// toward the interval actually observed.
    fn consume_interval(&mut self, interval_ns: f64, buf: &mut BitBuffer) {
        let tolerance = self.working_period * 0.25;
        let raw_cells = (interval_ns / self.working_period).round().max(1.0) as u32;
        let remainder = interval_ns - (raw_cells as f64) * self.working_period;

        match raw_cells {
            1 => self.stats.short += 1,
            2 => self.stats.medium += 1,
            3 => self.stats.long += 1,
            _ => {
                if interval_ns < self.working_period - tolerance {
                    self.stats.too_short += 1;
                }
                else {
                    self.stats.too_long += 1;
                }
            }
        }

        for _ in 1..raw_cells {
            buf.push_bit(false);
        }
        buf.push_bit(true);

        // Gated proportional control: only trust small, plausible errors.
        if remainder.abs() <= tolerance {
            let adjust = remainder * self.gains.phase_gain;
            let bound = self.working_period * self.gains.max_adjust;
            self.working_period += adjust.clamp(-bound, bound);
        }
        // Pull gently back toward the nominal rate so persistent small bias
        // cannot wander the loop away from the medium's true clock forever.
        self.working_period += (self.nominal_period_ns - self.working_period) * self.gains.clock_gain;
        trace!(
            "flux interval {interval_ns}ns -> {raw_cells} cells, working_period now {:.1}ns",
            self.working_period
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_250k_flux_decodes_to_expected_cell_counts() {
        let mut flux = FluxData::new();
        flux.push_revolution(vec![2000, 4000, 6000]);
        let mut pll = Pll::new(DataRate::Rate250Kbps);
        let buf = pll.decode(&flux, DataRate::Rate250Kbps);
        // 1 + 2 + 3 = 6 cells total, one reversal bit per interval.
        assert_eq!(buf.len(), 6);
        let bits: Vec<bool> = buf.iter_from(0).collect();
        assert_eq!(bits, vec![true, false, true, true, false, true]);
    }

    #[test]
    fn working_period_tracks_a_sustained_rate_shift() {
        let mut pll = Pll::new(DataRate::Rate250Kbps);
        let mut flux = FluxData::new();
        // Slightly fast medium: consistently 1900ns instead of 2000ns.
        flux.push_revolution(vec![1900; 50]);
        let _ = pll.decode(&flux, DataRate::Rate250Kbps);
        assert!(pll.working_period_ns() < 2000.0);
        assert!(pll.working_period_ns() > 1800.0);
    }
}
