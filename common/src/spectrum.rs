//! Seven-band graphic-equalizer front end (MSGEQ7 style).
//!
//! The chip multiplexes its band peak detectors onto one analog output. A
//! reset pulse rewinds the multiplexer to band 0; each strobe low edge
//! presents the next band, which settles for a few tens of microseconds
//! before it can be read.

use anyhow::Result;
use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::error_with_location;

pub const SPECTRUM_BANDS: usize = 7;

/// Output settle time after the strobe falls.
pub const STROBE_SETTLE_US: u32 = 30;

/// One amplitude per band, 0..=1023.
pub type SpectrumSample = [u16; SPECTRUM_BANDS];

/// A single analog channel. Reads never fail; values are 10-bit.
pub trait AnalogInput {
    fn read_sample(&mut self) -> u16;
}

/// Anything that can produce a spectrum once per frame.
pub trait SpectrumSource {
    fn sample(&mut self) -> Result<SpectrumSample>;
}

pub struct SpectrumSampler<R, S, D, A> {
    reset: R,
    strobe: S,
    delay: D,
    adc: A,
}

impl<R, S, D, A> SpectrumSampler<R, S, D, A>
where
    R: OutputPin,
    S: OutputPin,
    D: DelayNs,
    A: AnalogInput,
{
    /// Takes the pins and parks the lines idle: reset low, strobe high.
    pub fn new(mut reset: R, mut strobe: S, delay: D, adc: A) -> Result<Self> {
        reset
            .set_low()
            .map_err(|err| error_with_location!("Failed to park reset line: {:?}", err))?;
        strobe
            .set_high()
            .map_err(|err| error_with_location!("Failed to park strobe line: {:?}", err))?;
        Ok(Self {
            reset,
            strobe,
            delay,
            adc,
        })
    }
}

impl<R, S, D, A> SpectrumSource for SpectrumSampler<R, S, D, A>
where
    R: OutputPin,
    S: OutputPin,
    D: DelayNs,
    A: AnalogInput,
{
    fn sample(&mut self) -> Result<SpectrumSample> {
        self.reset
            .set_high()
            .and_then(|_| self.reset.set_low())
            .map_err(|err| error_with_location!("Failed to pulse reset: {:?}", err))?;

        let mut bands = [0; SPECTRUM_BANDS];
        for band in bands.iter_mut() {
            self.strobe
                .set_low()
                .map_err(|err| error_with_location!("Failed to lower strobe: {:?}", err))?;
            self.delay.delay_us(STROBE_SETTLE_US);
            *band = self.adc.read_sample().min(1023);
            self.strobe
                .set_high()
                .map_err(|err| error_with_location!("Failed to raise strobe: {:?}", err))?;
        }
        Ok(bands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use core::convert::Infallible;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Reset(bool),
        Strobe(bool),
        Delay(u32),
        Read,
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    struct Pin {
        log: Log,
        is_reset: bool,
    }

    impl embedded_hal::digital::ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            let e = if self.is_reset { Event::Reset(false) } else { Event::Strobe(false) };
            self.log.borrow_mut().push(e);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            let e = if self.is_reset { Event::Reset(true) } else { Event::Strobe(true) };
            self.log.borrow_mut().push(e);
            Ok(())
        }
    }

    struct Delay(Log);

    impl DelayNs for Delay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().push(Event::Delay(ns / 1000));
        }

        fn delay_us(&mut self, us: u32) {
            self.0.borrow_mut().push(Event::Delay(us));
        }
    }

    struct Adc {
        log: Log,
        values: Vec<u16>,
    }

    impl AnalogInput for Adc {
        fn read_sample(&mut self) -> u16 {
            self.log.borrow_mut().push(Event::Read);
            self.values.remove(0)
        }
    }

    fn sampler(values: &[u16]) -> (SpectrumSampler<Pin, Pin, Delay, Adc>, Log) {
        let log: Log = Rc::default();
        let s = SpectrumSampler::new(
            Pin { log: log.clone(), is_reset: true },
            Pin { log: log.clone(), is_reset: false },
            Delay(log.clone()),
            Adc { log: log.clone(), values: values.to_vec() },
        )
        .unwrap();
        (s, log)
    }

    #[test]
    fn parks_lines_on_construction() {
        let (_s, log) = sampler(&[]);
        assert_eq!(*log.borrow(), [Event::Reset(false), Event::Strobe(true)]);
    }

    #[test]
    fn reads_seven_bands_in_strobe_order() {
        let (mut s, log) = sampler(&[10, 20, 30, 40, 50, 60, 70]);
        log.borrow_mut().clear();

        let bands = s.sample().unwrap();
        assert_eq!(bands, [10, 20, 30, 40, 50, 60, 70]);

        let log = log.borrow();
        assert_eq!(log[..2], [Event::Reset(true), Event::Reset(false)]);
        let strobes: Vec<_> = log[2..].chunks(4).collect();
        assert_eq!(strobes.len(), SPECTRUM_BANDS);
        for chunk in strobes {
            assert_eq!(
                chunk,
                [
                    Event::Strobe(false),
                    Event::Delay(STROBE_SETTLE_US),
                    Event::Read,
                    Event::Strobe(true)
                ]
            );
        }
    }

    #[test]
    fn clamps_out_of_range_readings() {
        let (mut s, _) = sampler(&[4095, 0, 0, 0, 0, 0, 1024]);
        let bands = s.sample().unwrap();
        assert_eq!(bands[0], 1023);
        assert_eq!(bands[6], 1023);
    }
}
