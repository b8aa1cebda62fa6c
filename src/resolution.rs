use alloc::{
    borrow::ToOwned as _,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use tracing::{debug, error, info_span};

use crate::{
    arguments::Arguments,
    errors::{ResolveError, ResolveErrorKind},
    inject::InjectAction,
    instance::Instance,
    instantiator::Callable,
    resolver::ResolverInner,
    scalar::ScalarEntry,
    signature::{ParameterType, Signature},
    stack::{BuildStack, Frame, FrameGuard},
};

/// State of one top-level resolution and its recursive descendants.
///
/// The build stack lives here, so concurrent resolutions never see each other's frames.
pub(crate) struct Resolution<'a> {
    inner: &'a ResolverInner,
    stack: BuildStack,
}

impl<'a> Resolution<'a> {
    #[inline]
    #[must_use]
    pub(crate) fn new(inner: &'a ResolverInner) -> Self {
        Self {
            inner,
            stack: BuildStack::new(),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Result<Instance, ResolveError> {
        // Aliases point straight to a buildable name, the target is never looked up as an alias again
        let target = self.inner.aliases.lock().get(name).cloned();
        let name = match target {
            Some(target) => {
                debug!(alias = name, target = %target, "Alias resolved");
                target
            }
            None => name.to_owned(),
        };

        let span = info_span!("resolve", name = %name, depth = self.stack.depth());
        let _guard = span.enter();

        let shared = self.inner.shared.lock().get(&name).cloned();
        if let Some(instance) = shared {
            debug!("Found in shared");
            return Ok(instance);
        }
        debug!("Not found in shared");

        let _frame = self.enter(Frame::Type(name.clone()), &name)?;

        let instance = self.build(&name)?;
        let instance = self.inject(&name, instance)?;

        let should_share = self.inner.should_share.lock().clone();
        if should_share(&name) {
            // The first stored instance wins, so every caller observes the same one
            let instance = self.inner.shared.lock().entry(name).or_insert(instance).clone();
            debug!("Shared");
            return Ok(instance);
        }

        Ok(instance)
    }

    fn enter(&self, frame: Frame, name: &str) -> Result<FrameGuard<'_>, ResolveError> {
        if self.stack.contains(&frame) {
            return Err(self.error(ResolveErrorKind::CircularDependency { name: name.to_owned() }));
        }

        let limit = self.inner.config.max_depth;
        if self.stack.depth() >= limit {
            return Err(self.error(ResolveErrorKind::DepthLimitExceeded {
                name: name.to_owned(),
                limit,
            }));
        }

        Ok(self.stack.push(frame))
    }

    fn build(&self, name: &str) -> Result<Instance, ResolveError> {
        let factory = self.inner.factories.lock().get(name).cloned();
        if let Some(factory) = factory {
            debug!("Building with factory");
            return self.invoke(&factory);
        }

        let descriptor = match self.inner.provider.describe(name) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => return Err(self.error(ResolveErrorKind::NotFound { name: name.to_owned() })),
            Err(err) => {
                return Err(self.error(ResolveErrorKind::ReflectionFailure {
                    name: name.to_owned(),
                    reason: err.to_string(),
                }))
            }
        };

        let Some(constructor) = descriptor.constructor() else {
            return Err(self.error(ResolveErrorKind::NotInstantiable { name: name.to_owned() }));
        };

        if constructor.signature().required_len() == 0 {
            debug!("Building without arguments");
            return constructor
                .call(Arguments::new())
                .map_err(|err| self.error(ResolveErrorKind::Instantiate(err)));
        }

        debug!("Building with constructor");
        self.invoke(constructor)
    }

    fn invoke(&self, callable: &Callable) -> Result<Instance, ResolveError> {
        let arguments = self.collect_arguments(callable.signature())?;

        callable
            .call(arguments)
            .map_err(|err| self.error(ResolveErrorKind::Instantiate(err)))
    }

    fn collect_arguments(&self, signature: &Signature) -> Result<Arguments, ResolveError> {
        let mut arguments = Arguments::new();

        for parameter in signature.parameters() {
            // Parameters with defaults trail the required ones, so the callee's defaults apply to the rest
            if parameter.has_default {
                debug!(parameter = %parameter.name, "Stopped at parameter with default");
                break;
            }

            let value = match &parameter.ty {
                ParameterType::Untyped | ParameterType::Builtin(_) => self.scalar_value(&parameter.name)?,
                ParameterType::Named(ty) => {
                    let instance = self.get(ty)?;
                    self.view(instance, ty)
                }
                ParameterType::Union(candidates) => {
                    return Err(self.error(ResolveErrorKind::AmbiguousParameterType {
                        parameter: parameter.name.to_string(),
                        candidates: candidates.iter().map(|candidate| candidate.to_string()).collect(),
                    }));
                }
            };
            arguments.push(value);
        }

        Ok(arguments)
    }

    fn scalar_value(&self, name: &str) -> Result<Instance, ResolveError> {
        let entry = self.inner.scalars.lock().get(name).cloned();
        let cell = match entry {
            Some(ScalarEntry::Value(value)) => return Ok(value),
            Some(ScalarEntry::Producer(cell)) => cell,
            None => return Err(self.error(ResolveErrorKind::ScalarMissing { name: name.to_owned() })),
        };

        if let Some(produced) = cell.produced.get() {
            return Ok(produced.clone());
        }

        let _frame = self.enter(Frame::Scalar(name.to_owned()), name)?;
        // Arguments are collected before the cell is locked, so producers waiting on each other
        // from different threads fail as a cycle instead of blocking
        let arguments = self.collect_arguments(cell.producer.signature())?;
        let produced = cell
            .produced
            .get_or_try_init(|| {
                debug!(scalar = name, "Running scalar producer");
                cell.producer
                    .call(arguments)
                    .map_err(|err| self.error(ResolveErrorKind::Instantiate(err)))
            })?
            .clone();

        let mut scalars = self.inner.scalars.lock();
        if let Some(entry) = scalars.get_mut(name) {
            if matches!(entry, ScalarEntry::Producer(current) if Arc::ptr_eq(current, &cell)) {
                *entry = ScalarEntry::Value(produced.clone());
                debug!(scalar = name, "Scalar memoized");
            }
        }

        Ok(produced)
    }

    /// Upcasts a resolved value to the view of the requested interface, if its type declares one
    fn view(&self, instance: Instance, requested: &str) -> Instance {
        self.inner
            .provider
            .describe_instance(&instance)
            .and_then(|descriptor| descriptor.upcast(&instance, requested))
            .unwrap_or(instance)
    }

    /// Runs the injections registered for interfaces the value's type declares,
    /// and the ones registered under the name it's built for
    fn inject(&self, name: &str, instance: Instance) -> Result<Instance, ResolveError> {
        let injections: Vec<(String, InjectAction)> = {
            let injections = self.inner.injections.lock();
            if injections.is_empty() {
                return Ok(instance);
            }
            injections.iter().map(|(interface, action)| (interface.clone(), action.clone())).collect()
        };

        let mut instance = instance;
        let mut descriptor = self.inner.provider.describe_instance(&instance);

        for (interface, action) in injections {
            let declared = descriptor.as_ref().is_some_and(|descriptor| descriptor.implements(&interface));
            if !declared && interface != name {
                continue;
            }

            match action {
                InjectAction::Method(method_name) => {
                    let Some(descriptor) = descriptor.as_ref() else {
                        debug!(interface = %interface, method = %method_name, "Method skipped, value has no described type");
                        continue;
                    };
                    let Some(method) = descriptor.method(&method_name) else {
                        return Err(self.error(ResolveErrorKind::InjectionTargetInvalid {
                            interface,
                            target: method_name,
                        }));
                    };

                    let arguments = self.collect_arguments(method.signature())?;
                    method
                        .call(instance.clone(), arguments)
                        .map_err(|err| self.error(ResolveErrorKind::Instantiate(err)))?;

                    debug!(interface = %interface, method = %method_name, "Method injected");
                }
                InjectAction::Hook(hook) => {
                    let mut arguments = self.collect_arguments(hook.signature())?;
                    let view = descriptor
                        .as_ref()
                        .and_then(|descriptor| descriptor.upcast(&instance, &interface))
                        .unwrap_or_else(|| instance.clone());
                    arguments.push_front(view);

                    let replacement = hook
                        .call(arguments)
                        .map_err(|err| self.error(ResolveErrorKind::Instantiate(err)))?;

                    debug!(interface = %interface, "Hook injected");

                    if let Some(replacement) = replacement {
                        instance = replacement;
                        descriptor = self.inner.provider.describe_instance(&instance);
                        debug!("Replaced by hook");
                    }
                }
            }
        }

        Ok(instance)
    }

    #[must_use]
    fn error(&self, kind: ResolveErrorKind) -> ResolveError {
        let err = ResolveError::new(kind, self.stack.chain());
        error!("{}", err);
        err
    }
}
