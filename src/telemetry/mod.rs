pub(crate) mod oltp;

use opentelemetry::global;
use opentelemetry::metrics::Meter;

pub use oltp::init_meter;

pub fn get_meter() -> Meter {
    global::meter_provider().meter("mc-honeypot")
}
