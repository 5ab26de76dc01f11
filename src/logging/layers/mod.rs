use tracing::Subscriber;
use tracing_subscriber::layer::Layer;

pub mod console;
pub mod file;
pub mod opentelemetry;

/// Boxed layer so disabled sinks and concrete layers share one collection type.
pub type BoxLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Layer that performs no work, standing in for a disabled sink.
pub struct NoopLayer;

impl<S> Layer<S> for NoopLayer where S: Subscriber {}

pub fn noop_layer<S>() -> BoxLayer<S>
where
    S: Subscriber + 'static,
{
    Box::new(NoopLayer)
}
