use crate::weight::interface::AsyncStrainGaugeInterface;
use embassy_time::{Duration, Ticker, Timer};

/// Gain selection doubles as channel selection on the HX711; it is encoded
/// in the number of clock pulses per conversion readout.
#[allow(dead_code)]
pub enum Hx711Gain {
    Gain128,
    Gain64,
    Gain32ChannelB,
}

impl Hx711Gain {
    fn clocks_per_readout(&self) -> usize {
        match self {
            Hx711Gain::Gain128 => 25,
            Hx711Gain::Gain64 => 27,
            Hx711Gain::Gain32ChannelB => 26,
        }
    }
}

const POWER_MODE_CHANGE_DELAY: Duration = Duration::from_micros(60);
const CLK_HALF_PERIOD: Duration = Duration::from_micros(1);
const VALID_DATA_BITS: usize = 24;

#[derive(Debug)]
pub enum Error<OutPinE, InPinE> {
    OutPin(OutPinE),
    InPin(InPinE),
}

pub struct Hx711Async<CLK, DATA> {
    clock_pin: CLK,
    data_pin: DATA,
    readout_clocks: usize,
    powered_up: bool,
}

impl<CLK, DATA, ClkE, DataE> Hx711Async<CLK, DATA>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal_async::digital::Wait<Error = DataE>
        + embedded_hal::digital::InputPin<Error = DataE>,
{
    pub fn new(clock_pin: CLK, data_pin: DATA, gain: Hx711Gain) -> Self {
        Self {
            clock_pin,
            data_pin,
            readout_clocks: gain.clocks_per_readout(),
            powered_up: false,
        }
    }

    async fn power_up(&mut self) -> Result<(), Error<ClkE, DataE>> {
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        Timer::after(POWER_MODE_CHANGE_DELAY).await;
        self.powered_up = true;
        Ok(())
    }

    /// Clock one bit out of the shift register.
    async fn clock_bit(&mut self, ticker: &mut Ticker) -> Result<bool, Error<ClkE, DataE>> {
        self.clock_pin.set_high().map_err(Error::OutPin)?;
        ticker.next().await;
        self.clock_pin.set_low().map_err(Error::OutPin)?;
        let bit = self.data_pin.is_high().map_err(Error::InPin)?;
        ticker.next().await;
        Ok(bit)
    }
}

impl<CLK, DATA, ClkE, DataE> AsyncStrainGaugeInterface for Hx711Async<CLK, DATA>
where
    CLK: embedded_hal::digital::OutputPin<Error = ClkE>,
    DATA: embedded_hal_async::digital::Wait<Error = DataE>
        + embedded_hal::digital::InputPin<Error = DataE>,
{
    type Error = Error<ClkE, DataE>;

    async fn initialize(&mut self) -> Result<(), Self::Error> {
        self.power_up().await
    }

    fn reading_available(&mut self) -> Result<bool, Self::Error> {
        // DOUT is held high while a conversion is in progress and drops low
        // once data is ready to clock out.
        self.data_pin.is_low().map_err(Error::InPin)
    }

    async fn get_next_reading(&mut self) -> Result<i32, Self::Error> {
        if !self.powered_up {
            self.power_up().await?;
        }

        self.data_pin.wait_for_low().await.map_err(Error::InPin)?;

        // The extra clocks past the 24 data bits program the gain for the
        // next conversion; their sampled bits are discarded below.
        let mut clock_ticker = Ticker::every(CLK_HALF_PERIOD);
        clock_ticker.next().await;
        let mut shifted: i32 = 0;
        for _ in 0..self.readout_clocks {
            let bit = self.clock_bit(&mut clock_ticker).await?;
            shifted = (shifted << 1) | bit as i32;
        }

        let gain_select_bits = self.readout_clocks - VALID_DATA_BITS;
        let mut data = (shifted >> gain_select_bits) & ((1 << VALID_DATA_BITS) - 1);
        // 24-bit two's complement, extend the sign
        if (data >> (VALID_DATA_BITS - 1)) & 0x1 == 0x1 {
            data |= 0xFF000000u32 as i32;
        }
        Ok(data)
    }
}
