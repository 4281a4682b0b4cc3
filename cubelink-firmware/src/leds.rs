//! Status LEDs

use embassy_rp::gpio::Output;

use cubelink_core::traits::Indicator;

/// The board's two status LEDs
pub struct StatusLeds {
    red: Output<'static>,
    green: Output<'static>,
}

impl StatusLeds {
    pub fn new(red: Output<'static>, green: Output<'static>) -> Self {
        Self { red, green }
    }
}

impl Indicator for StatusLeds {
    fn set_all(&mut self, on: bool) {
        if on {
            self.red.set_high();
            self.green.set_high();
        } else {
            self.red.set_low();
            self.green.set_low();
        }
    }

    fn toggle_all(&mut self) {
        self.red.toggle();
        self.green.toggle();
    }

    fn activity(&mut self) {
        // Green flips on every frame; red keeps showing link state
        self.green.toggle();
    }
}
