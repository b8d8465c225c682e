use common::spectrum::AnalogInput;
use esp_hal::{
    Blocking,
    analog::adc::{Adc, AdcPin},
    peripherals::{ADC1, GPIO1},
};

/// MSGEQ7 output on GPIO1. The 12-bit reading is shifted down to 10 bits.
pub struct SpectrumAdc<'d> {
    pub adc: Adc<'d, ADC1<'d>, Blocking>,
    pub pin: AdcPin<GPIO1<'d>, ADC1<'d>>,
}

impl AnalogInput for SpectrumAdc<'_> {
    fn read_sample(&mut self) -> u16 {
        match nb::block!(self.adc.read_oneshot(&mut self.pin)) {
            Ok(raw) => raw >> 2,
            Err(err) => {
                log::warn!("ADC read failed: {err:?}");
                0
            }
        }
    }
}
