use alloc::{borrow::ToOwned as _, collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::any::type_name;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    catalog::SignatureProvider,
    config::Config,
    errors::{RegistrationErrorKind, ResolveError, ResolveErrorKind},
    inject::InjectAction,
    instance::Instance,
    instantiator::Callable,
    resolution::Resolution,
    scalar::{Scalar, ScalarEntry},
};

pub(crate) type SharePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Builds values by name, recursively resolving their constructor parameters.
///
/// Cloning is cheap and every clone shares the same tables.
#[derive(Clone)]
pub struct Resolver {
    pub(crate) inner: Arc<ResolverInner>,
}

impl Resolver {
    #[inline]
    #[must_use]
    pub fn new(provider: impl SignatureProvider + 'static) -> Self {
        Self::with_config(provider, Config::default())
    }

    #[must_use]
    pub fn with_config(provider: impl SignatureProvider + 'static, config: Config) -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                provider: Arc::new(provider),
                config,
                shared: Mutex::new(BTreeMap::new()),
                aliases: Mutex::new(BTreeMap::new()),
                scalars: Mutex::new(BTreeMap::new()),
                factories: Mutex::new(BTreeMap::new()),
                injections: Mutex::new(BTreeMap::new()),
                should_share: Mutex::new(Arc::new(|_: &str| true)),
            }),
        }
    }

    /// Creates a resolver with initial scalars and aliases
    ///
    /// # Errors
    /// Returns an error if the aliases form a chain, see [`Self::add_alias`]
    pub fn seeded<N, A, T>(
        provider: impl SignatureProvider + 'static,
        scalars: impl IntoIterator<Item = (N, Scalar)>,
        aliases: impl IntoIterator<Item = (A, T)>,
    ) -> Result<Self, RegistrationErrorKind>
    where
        N: Into<String>,
        A: Into<String>,
        T: Into<String>,
    {
        let resolver = Self::new(provider);
        for (name, scalar) in scalars {
            resolver.add_scalar(name, scalar);
        }
        for (alias, target) in aliases {
            resolver.add_alias(alias, target)?;
        }
        Ok(resolver)
    }

    /// Resolves a value by its name, or by an alias of it.
    ///
    /// Shared values are returned as is. Otherwise the value is built with a registered factory
    /// or the type's constructor, setter injections are applied
    /// and the result is stored as shared if the sharing policy allows it.
    ///
    /// # Errors
    /// Returns an error if the name or one of its dependencies can't be built.
    /// The error has the chain of names under construction at the moment of the failure.
    pub fn resolve(&self, name: &str) -> Result<Instance, ResolveError> {
        Resolution::new(&self.inner).get(name)
    }

    /// Resolves a value and downcasts it to its concrete type
    ///
    /// # Errors
    /// - Returns an error if the value can't be resolved, see [`Self::resolve`]
    /// - Returns [`ResolveErrorKind::IncorrectType`] if the value has another type
    pub fn get<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        let instance = self.resolve(name)?;

        instance
            .downcast()
            .ok_or_else(|| incorrect_type(name, type_name::<T>(), &instance))
    }

    /// Resolves a value and returns its view as `T`, for example `dyn Engine`.
    ///
    /// The value is returned as is if it's already a view of `T`. Otherwise the view is taken from
    /// the interface declared under `name` by the value's type, then from any other interface it declares.
    ///
    /// # Errors
    /// - Returns an error if the value can't be resolved, see [`Self::resolve`]
    /// - Returns [`ResolveErrorKind::IncorrectType`] if there is no view of `T`
    pub fn get_dyn<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, ResolveError> {
        let instance = self.resolve(name)?;
        if let Some(view) = instance.downcast_dyn() {
            return Ok(view);
        }

        self.inner
            .provider
            .describe_instance(&instance)
            .and_then(|descriptor| {
                descriptor
                    .upcast(&instance, name)
                    .and_then(|view| view.downcast_dyn())
                    .or_else(|| {
                        descriptor
                            .interfaces()
                            .find_map(|interface| descriptor.upcast(&instance, interface)?.downcast_dyn())
                    })
            })
            .ok_or_else(|| incorrect_type(name, type_name::<T>(), &instance))
    }

    /// Stores a value as shared under `name`, replacing the previous one
    pub fn set<T: Send + Sync + 'static>(&self, name: impl Into<String>, value: T) -> &Self {
        self.set_instance(name, Instance::new(value))
    }

    pub fn set_instance(&self, name: impl Into<String>, instance: Instance) -> &Self {
        let name = name.into();
        debug!(name = %name, "Shared value set");
        self.inner.shared.lock().insert(name, instance);
        self
    }

    /// Whether `name` can be looked up: a shared value, an alias, a scalar, a factory
    /// or a type known to the provider. Interfaces and abstract types count as known.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        let registered = self.inner.shared.lock().contains_key(name)
            || self.inner.aliases.lock().contains_key(name)
            || self.inner.scalars.lock().contains_key(name)
            || self.inner.factories.lock().contains_key(name);

        registered || self.inner.provider.exists(name)
    }

    /// Removes the shared value, the next resolution builds a new one
    pub fn forget(&self, name: &str) -> &Self {
        if self.inner.shared.lock().remove(name).is_some() {
            debug!(name, "Shared value forgotten");
        }
        self
    }

    /// Makes `alias` resolve as `target`.
    ///
    /// # Errors
    /// - Returns [`RegistrationErrorKind::TargetIsAlias`] if `target` is an alias itself
    /// - Returns [`RegistrationErrorKind::AliasIsTarget`] if another alias points to `alias`
    pub fn add_alias(&self, alias: impl Into<String>, target: impl Into<String>) -> Result<&Self, RegistrationErrorKind> {
        let (alias, target) = (alias.into(), target.into());

        let mut aliases = self.inner.aliases.lock();
        if aliases.contains_key(&target) {
            let err = RegistrationErrorKind::TargetIsAlias { alias, target };
            error!("{}", err);
            return Err(err);
        }
        if let Some(aliased_by) = aliases
            .iter()
            .find_map(|(other, other_target)| (*other_target == alias).then(|| other.clone()))
        {
            let err = RegistrationErrorKind::AliasIsTarget { alias, aliased_by };
            error!("{}", err);
            return Err(err);
        }

        debug!(alias = %alias, target = %target, "Alias added");
        aliases.insert(alias, target);
        Ok(self)
    }

    /// Registers a value for parameters named `name` that have no type or a builtin type
    pub fn add_scalar(&self, name: impl Into<String>, scalar: impl Into<Scalar>) -> &Self {
        let name = name.into();
        debug!(name = %name, "Scalar added");
        self.inner.scalars.lock().insert(name, ScalarEntry::from(scalar.into()));
        self
    }

    /// Registers a factory used instead of the type's constructor
    pub fn add_factory(&self, name: impl Into<String>, factory: Callable) -> &Self {
        let name = name.into();
        debug!(name = %name, provides = %factory.provides(), "Factory added");
        self.inner.factories.lock().insert(name, factory);
        self
    }

    /// Sets the policy deciding which built values are stored as shared. Everything is shared by default.
    pub fn set_should_share<F>(&self, predicate: F) -> &Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        *self.inner.should_share.lock() = Arc::new(predicate);
        self
    }

    /// Registers setter injection for every built value whose type implements `interface`
    pub fn inject(&self, interface: impl Into<String>, action: InjectAction) -> &Self {
        let interface = interface.into();
        debug!(interface = %interface, "Injection added");
        self.inner.injections.lock().insert(interface, action);
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

fn incorrect_type(name: &str, expected: &'static str, instance: &Instance) -> ResolveError {
    let err = ResolveError::new(
        ResolveErrorKind::IncorrectType {
            name: name.to_owned(),
            expected,
            actual: instance.type_info().name,
        },
        Vec::new(),
    );
    error!("{}", err);
    err
}

pub(crate) struct ResolverInner {
    pub(crate) provider: Arc<dyn SignatureProvider>,
    pub(crate) config: Config,
    pub(crate) shared: Mutex<BTreeMap<String, Instance>>,
    pub(crate) aliases: Mutex<BTreeMap<String, String>>,
    pub(crate) scalars: Mutex<BTreeMap<String, ScalarEntry>>,
    pub(crate) factories: Mutex<BTreeMap<String, Callable>>,
    pub(crate) injections: Mutex<BTreeMap<String, InjectAction>>,
    pub(crate) should_share: Mutex<SharePredicate>,
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Resolver;
    use crate::{
        arguments::Arguments,
        catalog::{Catalog, TypeDef},
        config::Config,
        errors::{InstantiateErrorKind, RegistrationErrorKind, ResolveErrorKind},
        instance::Instance,
        instantiator::Callable,
        scalar::Scalar,
        signature::{Parameter, Signature},
    };

    use alloc::{
        format,
        string::{String, ToString as _},
        sync::Arc,
        vec::Vec,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    trait Engine: Send + Sync {
        fn power(&self) -> u32;
    }

    #[derive(Default)]
    struct ElectricEngine;

    impl Engine for ElectricEngine {
        fn power(&self) -> u32 {
            150
        }
    }

    struct Car {
        engine: Arc<dyn Engine>,
    }

    struct Gauge {
        unit: String,
        max: i64,
    }

    fn catalog() -> Catalog {
        Catalog::new()
            .interface("Engine")
            .provide(
                TypeDef::<ElectricEngine>::new("ElectricEngine")
                    .default_constructor()
                    .implements("Engine", |engine| engine as Arc<dyn Engine>),
            )
            .provide(TypeDef::<Car>::new("Car").constructor(
                Signature::new([Parameter::object("engine", "Engine")]),
                |mut arguments: Arguments| {
                    debug!("Call car constructor");
                    Ok::<_, InstantiateErrorKind>(Car {
                        engine: arguments.take_dyn()?,
                    })
                },
            ))
            .provide(TypeDef::<Gauge>::new("Gauge").constructor(
                Signature::new([Parameter::builtin("unit", "string"), Parameter::builtin("max", "int").with_default()]),
                |mut arguments: Arguments| {
                    Ok::<_, InstantiateErrorKind>(Gauge {
                        unit: arguments.value()?,
                        max: arguments.value_or(200)?,
                    })
                },
            ))
    }

    #[test]
    #[traced_test]
    fn test_resolve_through_alias() {
        let resolver = Resolver::new(catalog());
        resolver.add_alias("Engine", "ElectricEngine").unwrap();

        let car = resolver.get::<Car>("Car").unwrap();
        let engine = resolver.get_dyn::<dyn Engine>("Engine").unwrap();

        assert_eq!(car.engine.power(), 150);
        assert_eq!(engine.power(), 150);
        assert!(resolver.get::<ElectricEngine>("Engine").is_ok());
    }

    #[test]
    #[traced_test]
    fn test_shared_by_default() {
        let resolver = Resolver::new(catalog());

        let first = resolver.resolve("ElectricEngine").unwrap();
        let second = resolver.resolve("ElectricEngine").unwrap();

        assert!(first.ptr_eq(&second));

        resolver.forget("ElectricEngine");

        assert!(!resolver.resolve("ElectricEngine").unwrap().ptr_eq(&first));
    }

    #[test]
    #[traced_test]
    fn test_should_share() {
        let resolver = Resolver::new(catalog());
        resolver.set_should_share(|name| name != "ElectricEngine");

        let first = resolver.resolve("ElectricEngine").unwrap();
        let second = resolver.resolve("ElectricEngine").unwrap();

        assert!(!first.ptr_eq(&second));
    }

    #[test]
    #[traced_test]
    fn test_set_replaces_shared() {
        let resolver = Resolver::new(catalog());
        resolver.set("Gauge", Gauge {
            unit: "rpm".to_string(),
            max: 8000,
        });

        let gauge = resolver.get::<Gauge>("Gauge").unwrap();

        assert_eq!((gauge.unit.as_str(), gauge.max), ("rpm", 8000));
    }

    #[test]
    #[traced_test]
    fn test_scalar_with_default() {
        let resolver = Resolver::new(catalog());
        resolver.add_scalar("unit", Scalar::value(String::from("km/h")));
        resolver.add_scalar("max", Scalar::value(1_i64));

        let gauge = resolver.get::<Gauge>("Gauge").unwrap();

        assert_eq!((gauge.unit.as_str(), gauge.max), ("km/h", 200));
    }

    #[test]
    #[traced_test]
    fn test_scalar_missing() {
        let resolver = Resolver::new(catalog());

        let err = resolver.resolve("Gauge").unwrap_err();

        assert!(matches!(err.kind(), ResolveErrorKind::ScalarMissing { name } if name == "unit"));
        assert_eq!(err.chain(), ["Gauge"]);
    }

    #[test]
    #[traced_test]
    fn test_producer_runs_once() {
        let call_count = Arc::new(AtomicU8::new(0));

        let resolver = Resolver::new(catalog());
        resolver.set_should_share(|_| false);
        resolver.add_scalar(
            "unit",
            Scalar::producer(Signature::empty(), {
                let call_count = call_count.clone();
                move |_: Arguments| {
                    call_count.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, InstantiateErrorKind>(String::from("mph"))
                }
            }),
        );

        assert_eq!(resolver.get::<Gauge>("Gauge").unwrap().unit, "mph");
        assert_eq!(resolver.get::<Gauge>("Gauge").unwrap().unit, "mph");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_factory_takes_priority() {
        let resolver = Resolver::new(catalog());
        resolver.add_factory(
            "Gauge",
            Callable::from_fn(|_: Arguments| {
                Ok::<_, InstantiateErrorKind>(Gauge {
                    unit: String::from("bar"),
                    max: 3,
                })
            }),
        );

        assert_eq!(resolver.get::<Gauge>("Gauge").unwrap().unit, "bar");
    }

    #[test]
    #[traced_test]
    fn test_alias_chain_rejected() {
        let resolver = Resolver::new(catalog());
        resolver.add_alias("Engine", "ElectricEngine").unwrap();

        assert_eq!(
            resolver.add_alias("Motor", "Engine").err(),
            Some(RegistrationErrorKind::TargetIsAlias {
                alias: String::from("Motor"),
                target: String::from("Engine"),
            })
        );
        assert_eq!(
            resolver.add_alias("ElectricEngine", "V8Engine").err(),
            Some(RegistrationErrorKind::AliasIsTarget {
                alias: String::from("ElectricEngine"),
                aliased_by: String::from("Engine"),
            })
        );
    }

    #[test]
    #[traced_test]
    fn test_seeded() {
        let resolver = Resolver::seeded(
            catalog(),
            [("unit", Scalar::value(String::from("km/h")))],
            [("Engine", "ElectricEngine")],
        )
        .unwrap();

        assert!(resolver.has("unit"));
        assert!(resolver.get::<Car>("Car").is_ok());
        assert!(resolver.get::<Gauge>("Gauge").is_ok());
    }

    #[test]
    #[traced_test]
    fn test_has() {
        let resolver = Resolver::new(catalog());
        resolver.set_instance("answer", Instance::new(42_u8));

        assert!(resolver.has("answer"));
        assert!(resolver.has("Engine"));
        assert!(resolver.has("Car"));
        assert!(!resolver.has("Truck"));
    }

    #[test]
    #[traced_test]
    fn test_incorrect_type() {
        let resolver = Resolver::new(catalog());

        let err = resolver.get::<Car>("ElectricEngine").err().unwrap();

        assert!(matches!(err.kind(), ResolveErrorKind::IncorrectType { .. }));
    }

    #[test]
    #[traced_test]
    fn test_depth_limit() {
        let resolver = Resolver::with_config(catalog(), Config { max_depth: 1 });
        resolver.add_alias("Engine", "ElectricEngine").unwrap();

        let err = resolver.resolve("Car").unwrap_err();

        assert!(matches!(err.kind(), ResolveErrorKind::DepthLimitExceeded { limit: 1, .. }));
        assert!(resolver.resolve("ElectricEngine").is_ok());
    }

    #[test]
    #[traced_test]
    fn test_thread_safe() {
        let resolver = Resolver::new(catalog());
        resolver.add_alias("Engine", "ElectricEngine").unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let resolver = resolver.clone();
                std::thread::spawn(move || resolver.resolve("Car").unwrap())
            })
            .collect();
        let cars: Vec<_> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

        assert!(cars.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    }
}
