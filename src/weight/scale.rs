use crate::weight::interface::AsyncStrainGaugeInterface;
use defmt::trace;
use embassy_time::{with_timeout, Duration, Instant};
use heapless::Vec;
use micromath::statistics::Mean;
use scalebridge_core::filter::WeightFilter;

const TARE_MEASUREMENTS: usize = 10;

/// Longest gap between two conversions before the sensor is considered
/// absent. The HX711 produces 10 conversions per second at its slow rate.
const CONVERSION_TIMEOUT: Duration = Duration::from_millis(600);

#[derive(Debug)]
pub enum Error<StrainGaugeE> {
    StrainGaugeReadingError(StrainGaugeE),
    /// No conversion arrived during the warm-up window.
    SignalTimeout,
    /// The sensor stopped producing conversions while taring.
    TareTimeout,
}

/// Converts raw strain gauge conversions into gated weights in grams.
/// Holds the tare offset and calibration gradient for the lifetime of the
/// process; neither survives a power cycle.
pub struct WeightScale<StrainGauge> {
    strain_gauge: StrainGauge,
    filter: WeightFilter,
    tare_offset: f32,
    calibration_gradient: f32,
}

impl<StrainGauge, StrainGaugeE> WeightScale<StrainGauge>
where
    StrainGauge: AsyncStrainGaugeInterface<Error = StrainGaugeE>,
{
    pub async fn new(mut strain_gauge: StrainGauge) -> Result<Self, Error<StrainGaugeE>> {
        strain_gauge
            .initialize()
            .await
            .map_err(Error::StrainGaugeReadingError)?;
        Ok(Self {
            strain_gauge,
            filter: WeightFilter::new(),
            tare_offset: 0.0,
            calibration_gradient: 1.0,
        })
    }

    /// One-time calibration constant, grams per ADC count.
    pub fn set_cal_factor(&mut self, grams_per_count: f32) {
        self.calibration_gradient = grams_per_count;
    }

    /// Let the sensor settle for `stabilising_time`, discarding conversions,
    /// then optionally tare. Mirrors the power-on sequence of the HX711
    /// breakout libraries.
    pub async fn start(
        &mut self,
        stabilising_time: Duration,
        tare: bool,
    ) -> Result<(), Error<StrainGaugeE>> {
        let deadline = Instant::now() + stabilising_time;
        while Instant::now() < deadline {
            match with_timeout(CONVERSION_TIMEOUT, self.strain_gauge.get_next_reading()).await {
                Ok(reading) => {
                    reading.map_err(Error::StrainGaugeReadingError)?;
                }
                Err(_) => return Err(Error::SignalTimeout),
            }
        }

        if tare {
            self.tare().await?;
        }
        Ok(())
    }

    async fn tare(&mut self) -> Result<(), Error<StrainGaugeE>> {
        let mut measurement_buffer = Vec::<f32, TARE_MEASUREMENTS>::new();

        for _ in 0..TARE_MEASUREMENTS {
            let reading =
                match with_timeout(CONVERSION_TIMEOUT, self.strain_gauge.get_next_reading()).await {
                    Ok(reading) => reading.map_err(Error::StrainGaugeReadingError)?,
                    Err(_) => return Err(Error::TareTimeout),
                };
            measurement_buffer
                .push(reading as f32)
                .expect("Too many readings taken by tare function");
        }

        self.tare_offset = measurement_buffer.into_iter().mean();
        trace!("Tare offset = {}", self.tare_offset);

        Ok(())
    }

    /// Non-blocking sample. Picks up a conversion if one is waiting and runs
    /// it through the noise gate; otherwise the previously filtered weight
    /// is returned unchanged. Callable at unbounded rate.
    pub async fn sample(&mut self) -> Result<f32, Error<StrainGaugeE>> {
        if self
            .strain_gauge
            .reading_available()
            .map_err(Error::StrainGaugeReadingError)?
        {
            let raw = self
                .strain_gauge
                .get_next_reading()
                .await
                .map_err(Error::StrainGaugeReadingError)?;
            let grams = (raw as f32 - self.tare_offset) * self.calibration_gradient;
            self.filter.ingest(grams);
            trace!("Conversion {} -> {} g filtered", raw, self.filter.latest());
        }
        Ok(self.filter.latest())
    }
}
