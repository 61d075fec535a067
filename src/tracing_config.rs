use error_stack::{Report, ResultExt};
use thiserror::Error;
use tracing::subscriber::set_global_default;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    fmt::{time::FormatTime, MakeWriter},
    layer::SubscriberExt,
    EnvFilter, Registry,
};

/// The error returned when tracing setup fails
#[derive(Error, Debug)]
#[error("Failed to configure tracing")]
pub struct TraceConfigureError;

/// Install a global tracing subscriber that prints to `writer`.
///
/// The filter is read from the `<env_prefix>LOG` environment variable, defaulting to `info`.
/// Pair this with [TracingSink](crate::TracingSink) to send request lines through the same
/// subscriber.
pub fn configure_tracing<FT, W>(
    env_prefix: &str,
    timer: FT,
    writer: W,
) -> Result<(), Report<TraceConfigureError>>
where
    FT: FormatTime + Send + Sync + 'static,
    for<'writer> W: MakeWriter<'writer> + Send + Sync + 'static,
{
    let env_name = format!("{env_prefix}LOG");
    let env_filter = EnvFilter::try_from_env(&env_name).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = Registry::default()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_timer(timer)
                .with_writer(writer),
        )
        .with(ErrorLayer::default());

    set_global_default(subscriber)
        .change_context(TraceConfigureError)
        .attach_printable_lazy(|| format!("filter variable {env_name}"))?;

    Ok(())
}

/// Tracing setup for tests
pub mod test {
    use std::sync::Once;

    use tracing_subscriber::fmt::TestWriter;

    static TRACING: Once = Once::new();

    /// Initialize tracing. This only starts tracing once per process, so is safe to
    /// call from every test.
    pub fn init() {
        TRACING.call_once(|| {
            super::configure_tracing(
                "TEST_",
                tracing_subscriber::fmt::time::Uptime::default(),
                TestWriter::new(),
            )
            .expect("starting tracing");
        })
    }
}
