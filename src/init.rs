use crate::emitter::{CeeSyslogConfig, CeeSyslogEmitter, EmitError};
use crate::layer::CeeSyslogLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Initialize global `tracing` subscription with a [`CeeSyslogLayer`]
/// built from the provided configuration.
///
/// **Parameters**
/// - `config`: [`CeeSyslogConfig`] describing the syslog address and
///   message-dict options.
///
/// **Errors**
///
/// Fails if the syslog transport cannot be opened. Installing the
/// subscriber itself panics if a global default is already set, as is
/// conventional for process-wide logging setup.
pub fn init_cee_syslog(config: CeeSyslogConfig) -> Result<(), EmitError> {
    let emitter = CeeSyslogEmitter::new(config)?;
    init_with_layer(CeeSyslogLayer::new(emitter), false);
    Ok(())
}

/// Install a pre-built layer as the global subscriber.
///
/// With `enable_stdout` a `tracing_subscriber::fmt` layer is stacked on
/// top, so events also show up on the console. The subscriber is
/// assembled in two variants for type compatibility.
pub fn init_with_layer(layer: CeeSyslogLayer, enable_stdout: bool) {
    if enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber).expect("set global subscriber");
    }
}
