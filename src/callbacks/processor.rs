// Callback registry for one operation kind, plus the per-call execution loop

use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

use crate::callbacks::context::{ExecResult, ReflectValue, Statement};
use crate::callbacks::error::CallbackError;
use crate::callbacks::sort::sort_callbacks;
use crate::callbacks::traits::{CallbackHandler, Handler, Matcher};
use crate::config::Config;
use crate::logger::Logger;
use crate::types::Operation;

/// What a declaration does to the handler slot of its name
#[derive(Clone)]
pub(crate) enum Action {
    Register(Handler),
    Replace(Handler),
    /// Tombstone: keeps the name resolvable for ordering, contributes no handler
    Remove,
}

impl Action {
    pub(crate) fn handler(&self) -> Option<&Handler> {
        match self {
            Action::Register(handler) | Action::Replace(handler) => Some(handler),
            Action::Remove => None,
        }
    }
}

/// One registration event. Declarations are append-only.
#[derive(Clone)]
pub(crate) struct Callback {
    pub(crate) name: String,
    pub(crate) before: Option<String>,
    pub(crate) after: Option<String>,
    pub(crate) matcher: Option<Matcher>,
    pub(crate) action: Action,
    pub(crate) location: &'static Location<'static>,
}

/// An entry of the compiled, ordered handler list
#[derive(Clone)]
pub(crate) struct CompiledCallback {
    pub(crate) name: String,
    pub(crate) handler: Handler,
}

#[derive(Default)]
struct ProcessorState {
    callbacks: Vec<Callback>,
    fns: Vec<CompiledCallback>,
}

/// Registration notice, worked out under the state lock and logged after it is released
enum Notice {
    Warn(String),
    Info(String),
}

impl Notice {
    fn for_declaration(callbacks: &[Callback], callback: &Callback) -> Option<Self> {
        match &callback.action {
            Action::Remove => Some(Notice::Warn(format!(
                "removing callback `{}` from {}",
                callback.name, callback.location
            ))),
            Action::Replace(_) => Some(Notice::Info(format!(
                "replacing callback `{}` from {}",
                callback.name, callback.location
            ))),
            Action::Register(_) => {
                let live_duplicate = callbacks
                    .iter()
                    .rev()
                    .find(|c| c.name == callback.name)
                    .map_or(false, |c| !matches!(c.action, Action::Remove));
                live_duplicate.then(|| {
                    Notice::Warn(format!(
                        "duplicated callback `{}` from {}",
                        callback.name, callback.location
                    ))
                })
            }
        }
    }

    fn emit(self, logger: &dyn Logger) {
        match self {
            Notice::Warn(message) => logger.warn(&message),
            Notice::Info(message) => logger.info(&message),
        }
    }
}

/// Registry and executor for the callbacks of a single operation kind.
///
/// Every register/remove/replace recompiles the ordered handler list. When a
/// compile fails the previous list stays in service, the rejected declaration
/// is dropped and the error is returned to the caller of the mutating call.
pub struct Processor {
    kind: Operation,
    config: Arc<RwLock<Config>>,
    logger: Arc<dyn Logger>,
    state: RwLock<ProcessorState>,
}

impl Processor {
    pub(crate) fn new(kind: Operation, config: Arc<RwLock<Config>>, logger: Arc<dyn Logger>) -> Self {
        Self {
            kind,
            config,
            logger,
            state: RwLock::new(ProcessorState::default()),
        }
    }

    pub fn kind(&self) -> Operation {
        self.kind
    }

    /// Start a declaration that must run before `name`
    pub fn before(&self, name: impl Into<String>) -> CallbackBuilder<'_> {
        CallbackBuilder::new(self).before(name)
    }

    /// Start a declaration that must run after `name`
    pub fn after(&self, name: impl Into<String>) -> CallbackBuilder<'_> {
        CallbackBuilder::new(self).after(name)
    }

    /// Start a declaration that only applies when `matcher` accepts the configuration
    pub fn when<F>(&self, matcher: F) -> CallbackBuilder<'_>
    where
        F: Fn(&Config) -> bool + Send + Sync + 'static,
    {
        CallbackBuilder::new(self).when(matcher)
    }

    #[track_caller]
    pub fn register<H>(&self, name: impl Into<String>, handler: H) -> Result<(), CallbackError>
    where
        H: CallbackHandler + 'static,
    {
        CallbackBuilder::new(self).register(name, handler)
    }

    #[track_caller]
    pub fn remove(&self, name: impl Into<String>) -> Result<(), CallbackError> {
        CallbackBuilder::new(self).remove(name)
    }

    #[track_caller]
    pub fn replace<H>(&self, name: impl Into<String>, handler: H) -> Result<(), CallbackError>
    where
        H: CallbackHandler + 'static,
    {
        CallbackBuilder::new(self).replace(name, handler)
    }

    /// Most recently registered live handler for `name`, ignoring compiled order
    pub fn get(&self, name: &str) -> Option<Handler> {
        let state = self.state.read();
        state
            .callbacks
            .iter()
            .rev()
            .find(|c| c.name == name && !matches!(c.action, Action::Remove))
            .and_then(|c| c.action.handler().cloned())
    }

    /// Names of the compiled handlers, in execution order
    pub fn callback_names(&self) -> Vec<String> {
        self.state.read().fns.iter().map(|c| c.name.clone()).collect()
    }

    /// Re-evaluate match predicates against the current configuration and rebuild the handler list
    pub fn compile(&self) -> Result<(), CallbackError> {
        let result = {
            let mut state = self.state.write();
            self.compile_state(&mut state)
        };
        self.report(&result);
        result
    }

    fn compile_state(&self, state: &mut ProcessorState) -> Result<(), CallbackError> {
        let config = self.config.read();
        let active: Vec<&Callback> = state
            .callbacks
            .iter()
            .filter(|c| c.matcher.as_ref().map_or(true, |matcher| matcher(&config)))
            .collect();

        let fns = sort_callbacks(&active)?;
        tracing::debug!(
            "Compiled {} callbacks: {} of {} declarations active, {} handlers",
            self.kind,
            active.len(),
            state.callbacks.len(),
            fns.len()
        );
        state.fns = fns;
        Ok(())
    }

    // Called with no processor lock held
    fn report(&self, result: &Result<(), CallbackError>) {
        if let Err(error) = result {
            self.logger.error(&format!(
                "Got error when compile {} callbacks, got {}",
                self.kind, error
            ));
        }
    }

    fn push(&self, callback: Callback) -> Result<(), CallbackError> {
        let (notice, result) = {
            let mut state = self.state.write();
            let notice = Notice::for_declaration(&state.callbacks, &callback);

            state.callbacks.push(callback);
            let result = self.compile_state(&mut state);
            if result.is_err() {
                // a rejected declaration never joins the registry
                state.callbacks.pop();
            }
            (notice, result)
        };

        if let Some(notice) = notice {
            notice.emit(self.logger.as_ref());
        }
        self.report(&result);
        result
    }

    /// Run one statement through the compiled handler chain.
    ///
    /// Every handler runs, in order, even after an earlier one failed; errors
    /// accumulate on the statement and are copied into the returned result.
    pub fn execute(&self, stmt: &mut Statement) -> ExecResult {
        let begin = Instant::now();

        if stmt.model.is_none() {
            stmt.model = stmt.dest.clone();
        }

        if let Some(model) = &stmt.model {
            match stmt.parser().parse(model) {
                Ok(schema) => stmt.schema = Some(schema),
                // scalar destinations are fine once the target is known
                Err(error) if error.is_unsupported_data_type() && stmt.has_target() => {
                    tracing::trace!("Model of {} is not parseable, target already known", stmt.id);
                }
                Err(error) => stmt.add_error(error),
            }
        }
        stmt.reflect_value = ReflectValue::of(stmt.dest.as_ref());

        // Snapshot so handlers may register callbacks without holding the lock
        let fns = self.state.read().fns.clone();

        let span = tracing::debug_span!("callbacks", operation = %self.kind, statement = %stmt.id);
        let _entered = span.enter();

        for callback in &fns {
            let started = Instant::now();
            match callback.handler.call(stmt) {
                Ok(()) => {
                    tracing::trace!("Callback: {} completed in {:?}", callback.name, started.elapsed());
                }
                Err(error) => {
                    tracing::debug!("Callback: {} failed in {:?}: {}", callback.name, started.elapsed(), error);
                    stmt.add_error(error);
                }
            }
        }

        let result = ExecResult {
            success: stmt.errors.is_empty(),
            errors: stmt.errors.clone(),
            rows_affected: stmt.rows_affected,
            execution_time: begin.elapsed(),
        };

        let explain = || (stmt.explain(), stmt.rows_affected);
        self.logger.trace(begin, &explain, result.error());

        result
    }
}

/// Fluent declaration builder; finish with `register`, `remove` or `replace`
#[must_use = "a callback declaration does nothing until registered"]
pub struct CallbackBuilder<'p> {
    processor: &'p Processor,
    before: Option<String>,
    after: Option<String>,
    matcher: Option<Matcher>,
}

impl<'p> CallbackBuilder<'p> {
    fn new(processor: &'p Processor) -> Self {
        Self {
            processor,
            before: None,
            after: None,
            matcher: None,
        }
    }

    pub fn before(mut self, name: impl Into<String>) -> Self {
        self.before = Some(name.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn after(mut self, name: impl Into<String>) -> Self {
        self.after = Some(name.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn when<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Config) -> bool + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    #[track_caller]
    pub fn register<H>(self, name: impl Into<String>, handler: H) -> Result<(), CallbackError>
    where
        H: CallbackHandler + 'static,
    {
        let location = Location::caller();
        self.finish(name.into(), Action::Register(Arc::new(handler)), location)
    }

    #[track_caller]
    pub fn remove(self, name: impl Into<String>) -> Result<(), CallbackError> {
        let location = Location::caller();
        self.finish(name.into(), Action::Remove, location)
    }

    #[track_caller]
    pub fn replace<H>(self, name: impl Into<String>, handler: H) -> Result<(), CallbackError>
    where
        H: CallbackHandler + 'static,
    {
        let location = Location::caller();
        self.finish(name.into(), Action::Replace(Arc::new(handler)), location)
    }

    fn finish(
        self,
        name: String,
        action: Action,
        location: &'static Location<'static>,
    ) -> Result<(), CallbackError> {
        self.processor.push(Callback {
            name,
            before: self.before,
            after: self.after,
            matcher: self.matcher,
            action,
            location,
        })
    }
}
