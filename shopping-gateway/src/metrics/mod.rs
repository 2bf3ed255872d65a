mod prometheus;

pub use self::prometheus::Metrics;
