//! Named fault-injection hooks.
//!
//! A control point is consulted synchronously before the simulated operation
//! of the same name runs. Returning an error short-circuits the operation with
//! that error; returning `Ok(())` lets it proceed normally.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::errors::ClassifiedError;

/// Hook invoked with the service and the in-flight call's arguments.
pub type ControlProcessor =
    Arc<dyn Fn(&dyn ServiceControl, &[String]) -> Result<(), ClassifiedError> + Send + Sync>;

/// Implemented by simulated services that expose control points.
pub trait ServiceControl: Send + Sync {
    fn control_points(&self) -> &ControlPoints;

    /// Install `processor` for `name`, replacing any existing hook.
    /// `None` removes the hook.
    fn register_control_point(&self, name: &str, processor: Option<ControlProcessor>) {
        self.control_points().register(name, processor);
    }

    /// Run the hook registered for `name`, if any.
    fn process_control_hook(&self, name: &str, args: &[String]) -> Result<(), ClassifiedError>
    where
        Self: Sized,
    {
        self.control_points().process(self, name, args)
    }
}

/// Registry of hooks, owned by one service instance.
#[derive(Default)]
pub struct ControlPoints {
    hooks: Mutex<HashMap<String, ControlProcessor>>,
}

impl ControlPoints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, name: &str, processor: Option<ControlProcessor>) {
        let mut hooks = self.hooks.lock().expect("control point mutex poisoned");
        match processor {
            Some(processor) => {
                tracing::debug!(control_point = %name, "Registering control point");
                hooks.insert(name.to_string(), processor);
            }
            None => {
                if hooks.remove(name).is_some() {
                    tracing::debug!(control_point = %name, "Cleared control point");
                }
            }
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.hooks
            .lock()
            .expect("control point mutex poisoned")
            .contains_key(name)
    }

    /// Drop every hook.
    pub fn clear(&self) {
        self.hooks
            .lock()
            .expect("control point mutex poisoned")
            .clear();
    }

    /// Consult the hook for `name`. The registry lock is released before the
    /// processor runs, so processors may call back into the service.
    pub fn process(
        &self,
        service: &dyn ServiceControl,
        name: &str,
        args: &[String],
    ) -> Result<(), ClassifiedError> {
        let processor = self
            .hooks
            .lock()
            .expect("control point mutex poisoned")
            .get(name)
            .cloned();

        match processor {
            Some(processor) => {
                let outcome = processor(service, args);
                if let Err(err) = &outcome {
                    tracing::debug!(control_point = %name, error = %err, "Control point injected failure");
                }
                outcome
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ControlPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.lock().expect("control point mutex poisoned");
        let mut names: Vec<_> = hooks.keys().collect();
        names.sort();
        f.debug_struct("ControlPoints").field("hooks", &names).finish()
    }
}

/// Wrap a closure as a [`ControlProcessor`].
pub fn processor<F>(f: F) -> ControlProcessor
where
    F: Fn(&dyn ServiceControl, &[String]) -> Result<(), ClassifiedError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Fail the first `times` calls with `err`, then let calls through.
pub fn fail_times(times: u32, err: ClassifiedError) -> ControlProcessor {
    let fired = AtomicU32::new(0);
    processor(move |_, _| {
        let seen = fired.fetch_add(1, Ordering::SeqCst);
        if seen < times {
            Err(err.clone())
        } else {
            Ok(())
        }
    })
}

/// Fail every call with `err`.
pub fn always(err: ClassifiedError) -> ControlProcessor {
    processor(move |_, _| Err(err.clone()))
}

/// Shared count of hook invocations.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicU32>);

impl CallCounter {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }
}

/// Wrap `inner` so every invocation is counted, whatever it returns.
pub fn counted(inner: ControlProcessor) -> (ControlProcessor, CallCounter) {
    let counter = CallCounter::default();
    let hits = counter.0.clone();
    let wrapped = processor(move |service, args| {
        hits.fetch_add(1, Ordering::SeqCst);
        inner(service, args)
    });
    (wrapped, counter)
}
