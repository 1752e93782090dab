use std::{sync::Arc, time::SystemTime};

use niwa::*;
use tracing_subscriber::EnvFilter;

// Define regular traits and implementor structs

trait Logger: Send + Sync {
    fn log(&self, content: &str);
}

trait DateLogger: Send + Sync {
    fn log_date(&self);
}

struct PrefixLogger {
    prefix: String,
}

impl Logger for PrefixLogger {
    fn log(&self, content: &str) {
        println!("[{}] {}", self.prefix, content);
    }
}

struct DateLoggerImpl {
    logger: Arc<dyn Logger>,
}

impl DateLoggerImpl {
    fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl DateLogger for DateLoggerImpl {
    fn log_date(&self) {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default();
        self.logger.log(&format!("{}s since epoch", now.as_secs()));
    }
}

// Declare how the container builds our components and which traits they serve

implements!(PrefixLogger: dyn Logger);
component!(DateLoggerImpl as "DateLogger" => DateLoggerImpl::new, Arc<dyn Logger>);
implements!(DateLoggerImpl: dyn DateLogger);

fn main() -> Result<(), ResolveError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Each logger is named after the component requesting it
    let mut root = Container::new();
    root.bind::<dyn Logger>().to_function(|ctx| {
        Ok(PrefixLogger {
            prefix: ctx.requester().name().to_string(),
        })
    });

    // Services bound in a child container can use the bindings of the root
    let mut child = root.child();
    child
        .bind::<dyn DateLogger>()
        .to::<DateLoggerImpl>()
        .in_singleton_scope();

    let date_logger: Arc<dyn DateLogger> = child.get()?;
    date_logger.log_date();

    let logger: Arc<dyn Logger> = root.get()?;
    logger.log("resolved without requester");

    if let Err(err) = root.get::<dyn DateLogger>() {
        logger.log(&err.to_string());
    }

    Ok(())
}
