pub mod hx711async;

pub trait AsyncStrainGaugeInterface {
    type Error;

    /// Initialise the gauge and make it ready for taking readings. Will put it into an initalized,
    /// powered up state.
    async fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Non-blocking check for an unread conversion. Must not wait; the
    /// caller polls this at its own cadence.
    fn reading_available(&mut self) -> Result<bool, Self::Error>;

    /// Gets next reading from the strain gauge. Returns promptly when
    /// `reading_available` is true, otherwise waits for the conversion.
    async fn get_next_reading(&mut self) -> Result<i32, Self::Error>;
}
