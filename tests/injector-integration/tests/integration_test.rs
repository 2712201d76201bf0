//! 注入器运行时的集成测试

use injector_abstractions::{
    Binding, LambdaModule, Module, ProvisionEvent, ProvisionListener, ScopeFactory,
};
use injector_common::{ConfigurationError, Key, ProvisionError};
use injector_impl::{
    BindingBuilder, Injector, SingletonScopeFactory, SINGLETON_SCOPE, THREAD_SCOPE,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

/// 测试组件：数据库句柄
#[derive(Debug)]
struct Database {
    url: String,
}

/// 测试组件：仓储，依赖数据库
#[derive(Debug)]
struct Repository {
    database: Arc<Database>,
}

/// 测试组件：服务，依赖仓储和命名数据库
#[derive(Debug)]
struct OrderService {
    repository: Arc<Repository>,
    replica: Arc<Database>,
}

fn graph_module() -> Box<dyn Module> {
    Box::new(LambdaModule::new("graph", |_scopes| {
        Ok(vec![
            BindingBuilder::<Database>::bind()
                .instance(Database {
                    url: "primary://db".to_string(),
                })?
                .into_binding()?,
            BindingBuilder::<Database>::bind()
                .named("replica")
                .instance(Database {
                    url: "replica://db".to_string(),
                })?
                .into_binding()?,
            BindingBuilder::<Repository>::bind()
                .to(vec![Key::of::<Database>()], |deps| {
                    Ok(Repository {
                        database: deps.get::<Database>(0)?,
                    })
                })?
                .into_binding()?,
            BindingBuilder::<OrderService>::bind()
                .to(
                    vec![Key::of::<Repository>(), Key::named::<Database>("replica")],
                    |deps| {
                        Ok(OrderService {
                            repository: deps.get::<Repository>(0)?,
                            replica: deps.get::<Database>(1)?,
                        })
                    },
                )?
                .into_binding()?,
        ])
    }))
}

#[test]
fn test_object_graph_resolution() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    let service = injector.get_instance::<OrderService>().unwrap();
    assert_eq!(service.repository.database.url, "primary://db");
    assert_eq!(service.replica.url, "replica://db");

    // 未限定与命名限定是不同的键空间
    let primary = injector.get_instance::<Database>().unwrap();
    let replica = injector.get_instance_named::<Database>("replica").unwrap();
    assert!(!Arc::ptr_eq(&primary, &replica));
}

#[test]
fn test_instance_binding_identity_across_calls() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    let first = injector.get_instance::<Database>().unwrap();
    for _ in 0..10 {
        let again = injector.get_instance::<Database>().unwrap();
        assert!(Arc::ptr_eq(&first, &again));
    }
}

#[test]
fn test_missing_binding_names_type_and_qualifier() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    let error = injector
        .get_instance_named::<Database>("archive")
        .unwrap_err();
    match error {
        ProvisionError::NoBinding { key } => {
            assert!(key.contains("Database"));
            assert!(key.contains("archive"));
        }
        other => panic!("意外的错误: {other}"),
    }
}

#[derive(Debug)]
struct Left {
    _right: Arc<Right>,
}
#[derive(Debug)]
struct Right {
    _left: Arc<Left>,
}

fn cyclic_bindings(scoped: bool) -> Box<dyn Module> {
    Box::new(LambdaModule::new("cyclic", move |scopes| {
        let left = BindingBuilder::<Left>::bind().to(vec![Key::of::<Right>()], |deps| {
            Ok(Left {
                _right: deps.get::<Right>(0)?,
            })
        })?;
        let right = BindingBuilder::<Right>::bind().to(vec![Key::of::<Left>()], |deps| {
            Ok(Right {
                _left: deps.get::<Left>(0)?,
            })
        })?;

        if scoped {
            Ok(vec![
                left.in_scope(scopes, SINGLETON_SCOPE)?.into_binding()?,
                right.in_scope(scopes, SINGLETON_SCOPE)?.into_binding()?,
            ])
        } else {
            Ok(vec![left.into_binding()?, right.into_binding()?])
        }
    }))
}

#[test]
fn test_dependency_cycle_rejected_at_configuration() {
    let injector = Injector::new();
    let error = injector.configure(&mut [cyclic_bindings(false)]).unwrap_err();
    match error {
        ConfigurationError::DependencyCycle { dependency_chain } => {
            assert!(dependency_chain.contains("Left"));
            assert!(dependency_chain.contains("Right"));
            assert!(dependency_chain.contains(" -> "));
        }
        other => panic!("意外的错误: {other}"),
    }
    assert!(!injector.is_configured());
}

#[test]
fn test_singleton_scoped_cycle_rejected_before_any_resolution() {
    // 作用域绑定的循环同样在配置时被拒绝，解析路径上不存在可以
    // 互相等待缓存锁的绑定组合
    let injector = Injector::new();
    let error = injector.configure(&mut [cyclic_bindings(true)]).unwrap_err();
    assert!(matches!(error, ConfigurationError::DependencyCycle { .. }));
    assert!(!injector.is_configured());
}

#[test]
fn test_singleton_scope_creates_exactly_once_under_concurrency() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructions);

    let injector = Arc::new(Injector::new());
    let mut modules: Vec<Box<dyn Module>> =
        vec![Box::new(LambdaModule::new("singleton", move |scopes| {
            let counter = Arc::clone(&counter);
            Ok(vec![BindingBuilder::<Database>::bind()
                .provider(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Database {
                        url: "singleton://db".to_string(),
                    })
                })?
                .in_scope(scopes, SINGLETON_SCOPE)?
                .into_binding()?])
        }))];
    injector.configure(&mut modules).unwrap();

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let injector = Arc::clone(&injector);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                injector.get_instance::<Database>().unwrap()
            })
        })
        .collect();

    let instances: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    // 竞争首次解析的调用方观察到同一个实例，底层构造恰好一次
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    for instance in &instances[1..] {
        assert!(Arc::ptr_eq(&instances[0], instance));
    }
}

#[test]
fn test_singleton_scope_does_not_reinvoke_provisioning_provider() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&constructions);

    let injector = Injector::new();
    let mut modules: Vec<Box<dyn Module>> =
        vec![Box::new(LambdaModule::new("singleton", move |scopes| {
            let counter = Arc::clone(&counter);
            Ok(vec![BindingBuilder::<Database>::bind()
                .provider(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(Database {
                        url: "cached://db".to_string(),
                    })
                })?
                .in_scope(scopes, SINGLETON_SCOPE)?
                .into_binding()?])
        }))];
    injector.configure(&mut modules).unwrap();

    let first = injector.get_instance::<Database>().unwrap();
    let second = injector.get_instance::<Database>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
}

/// 计数型监听器
#[derive(Default)]
struct CountingListener {
    events: AtomicUsize,
}

impl ProvisionListener for CountingListener {
    fn on_provision(
        &self,
        _event: &ProvisionEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.events.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_racing_singleton_resolution_fires_single_event() {
    let injector = Arc::new(Injector::new());
    let mut modules: Vec<Box<dyn Module>> =
        vec![Box::new(LambdaModule::new("singleton", |scopes| {
            Ok(vec![BindingBuilder::<Database>::bind()
                .provider(|| {
                    Ok(Database {
                        url: "event://db".to_string(),
                    })
                })?
                .in_scope(scopes, SINGLETON_SCOPE)?
                .into_binding()?])
        }))];
    injector.configure(&mut modules).unwrap();

    let listener = Arc::new(CountingListener::default());
    injector.bind_listener(listener.clone());

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let injector = Arc::clone(&injector);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                injector.get_instance::<Database>().unwrap()
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // 只有实际执行创建的线程触发事件，缓存命中方不再触发
    assert_eq!(listener.events.load(Ordering::SeqCst), 1);

    injector.get_instance::<Database>().unwrap();
    assert_eq!(listener.events.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dependent_on_cached_singleton_still_fires_event() {
    let injector = Injector::new();
    let mut modules: Vec<Box<dyn Module>> =
        vec![Box::new(LambdaModule::new("layered", |scopes| {
            Ok(vec![
                BindingBuilder::<Database>::bind()
                    .provider(|| {
                        Ok(Database {
                            url: "layered://db".to_string(),
                        })
                    })?
                    .in_scope(scopes, SINGLETON_SCOPE)?
                    .into_binding()?,
                BindingBuilder::<Repository>::bind()
                    .to(vec![Key::of::<Database>()], |deps| {
                        Ok(Repository {
                            database: deps.get::<Database>(0)?,
                        })
                    })?
                    .into_binding()?,
            ])
        }))];
    injector.configure(&mut modules).unwrap();

    let listener = Arc::new(CountingListener::default());
    injector.bind_listener(listener.clone());

    // 预热单例缓存，产生一次创建事件
    injector.get_instance::<Database>().unwrap();
    assert_eq!(listener.events.load(Ordering::SeqCst), 1);

    // 仓储自身被创建要触发事件，即便其依赖命中了单例缓存
    injector.get_instance::<Repository>().unwrap();
    assert_eq!(listener.events.load(Ordering::SeqCst), 2);
}

#[test]
fn test_failed_scoped_provision_is_not_cached() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&attempts);

    let injector = Injector::new();
    let mut modules: Vec<Box<dyn Module>> =
        vec![Box::new(LambdaModule::new("flaky", move |scopes| {
            let counter = Arc::clone(&counter);
            Ok(vec![BindingBuilder::<Database>::bind()
                .provider(move || {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        anyhow::bail!("数据库暂不可用");
                    }
                    Ok(Database {
                        url: "recovered://db".to_string(),
                    })
                })?
                .in_scope(scopes, SINGLETON_SCOPE)?
                .into_binding()?])
        }))];
    injector.configure(&mut modules).unwrap();

    // 首次供给失败向调用方传播，缓存槽保持空
    let error = injector.get_instance::<Database>().unwrap_err();
    assert!(matches!(error, ProvisionError::CreationFailed { .. }));

    // 下一次解析重试供给并正常发布缓存
    let instance = injector.get_instance::<Database>().unwrap();
    assert_eq!(instance.url, "recovered://db");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_thread_scope_caches_per_thread() {
    let injector = Arc::new(Injector::new());
    let mut modules: Vec<Box<dyn Module>> =
        vec![Box::new(LambdaModule::new("thread-scope", |scopes| {
            Ok(vec![BindingBuilder::<Database>::bind()
                .provider(|| {
                    Ok(Database {
                        url: "thread://db".to_string(),
                    })
                })?
                .in_scope(scopes, THREAD_SCOPE)?
                .into_binding()?])
        }))];
    injector.configure(&mut modules).unwrap();

    // 同一线程内命中缓存
    let first = injector.get_instance::<Database>().unwrap();
    let again = injector.get_instance::<Database>().unwrap();
    assert!(Arc::ptr_eq(&first, &again));

    // 其他线程得到各自的实例
    let other = {
        let injector = Arc::clone(&injector);
        thread::spawn(move || injector.get_instance::<Database>().unwrap())
            .join()
            .unwrap()
    };
    assert!(!Arc::ptr_eq(&first, &other));
}

#[test]
fn test_scope_factory_rejects_nested_scoped_binding() {
    let injector = Injector::new();

    let scoped_binding = BindingBuilder::<Database>::bind()
        .provider(|| {
            Ok(Database {
                url: "scoped://db".to_string(),
            })
        })
        .unwrap()
        .in_scope(&injector, SINGLETON_SCOPE)
        .unwrap()
        .into_binding()
        .unwrap();

    let result = SingletonScopeFactory.scoped_provider(&scoped_binding);
    assert!(matches!(result, Err(ConfigurationError::NestedScope { .. })));
}

/// 记录型监听器
#[derive(Default)]
struct RecordingListener {
    seen: Mutex<Vec<String>>,
}

impl ProvisionListener for RecordingListener {
    fn on_provision(
        &self,
        event: &ProvisionEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.seen.lock().unwrap().push(event.key().to_string());
        Ok(())
    }
}

#[test]
fn test_listener_notified_exactly_once_per_provision() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    let listener = Arc::new(RecordingListener::default());
    injector.bind_listener(listener.clone());

    let repository = injector.get_instance::<Repository>().unwrap();
    assert_eq!(repository.database.url, "primary://db");

    // 仓储及其依赖各产生一次供给事件，顺序为依赖先于被依赖者
    let seen = listener.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].contains("Database"));
    assert!(seen[1].contains("Repository"));
}

#[test]
fn test_unbound_listener_is_not_notified() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    let listener: Arc<RecordingListener> = Arc::new(RecordingListener::default());
    let erased: Arc<dyn ProvisionListener> = listener.clone();
    injector.bind_listener(erased.clone());
    injector.unbind_listener(&erased);

    injector.get_instance::<Database>().unwrap();
    assert!(listener.seen.lock().unwrap().is_empty());
}

/// 总是失败的监听器
struct RejectingListener;

impl ProvisionListener for RejectingListener {
    fn on_provision(
        &self,
        _event: &ProvisionEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err("审计存储不可用".into())
    }
}

#[test]
fn test_listener_failure_propagates_to_caller() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();
    injector.bind_listener(Arc::new(RejectingListener));

    let error = injector.get_instance::<Database>().unwrap_err();
    match error {
        ProvisionError::ListenerFailed { key, source } => {
            assert!(key.contains("Database"));
            assert!(source.to_string().contains("审计存储不可用"));
        }
        other => panic!("意外的错误: {other}"),
    }
}

#[test]
fn test_listeners_notified_in_registration_order() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    struct TaggingListener {
        tag: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
    }
    impl ProvisionListener for TaggingListener {
        fn on_provision(
            &self,
            _event: &ProvisionEvent,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.log.lock().unwrap().push(self.tag);
            Ok(())
        }
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    injector.bind_listener(Arc::new(TaggingListener {
        tag: "first",
        log: Arc::clone(&log),
    }));
    injector.bind_listener(Arc::new(TaggingListener {
        tag: "second",
        log: Arc::clone(&log),
    }));

    injector.get_instance::<Database>().unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
}

#[test]
fn test_provision_event_carries_typed_instance() {
    let injector = Injector::new();
    injector.configure(&mut [graph_module()]).unwrap();

    struct AssertingListener;
    impl ProvisionListener for AssertingListener {
        fn on_provision(
            &self,
            event: &ProvisionEvent,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            if event.key() == &Key::of::<Database>() {
                let database = event.typed_instance::<Database>().ok_or("类型不符")?;
                assert_eq!(database.url, "primary://db");
                assert_eq!(event.provider().kind(), "instance");
            }
            Ok(())
        }
    }
    injector.bind_listener(Arc::new(AssertingListener));

    injector.get_instance::<Database>().unwrap();
}

#[test]
fn test_concurrent_listener_mutation_does_not_corrupt_resolution() {
    let injector = Arc::new(Injector::new());
    injector.configure(&mut [graph_module()]).unwrap();

    let resolvers: Vec<_> = (0..4)
        .map(|_| {
            let injector = Arc::clone(&injector);
            thread::spawn(move || {
                for _ in 0..50 {
                    injector.get_instance::<Repository>().unwrap();
                }
            })
        })
        .collect();

    let mutator = {
        let injector = Arc::clone(&injector);
        thread::spawn(move || {
            for _ in 0..50 {
                let listener: Arc<dyn ProvisionListener> =
                    Arc::new(RecordingListener::default());
                injector.bind_listener(listener.clone());
                injector.unbind_listener(&listener);
            }
        })
    };

    for handle in resolvers {
        handle.join().unwrap();
    }
    mutator.join().unwrap();
}

#[test]
fn test_scoped_binding_via_raw_factory_binding() {
    // 作用域绑定也可以不经过构建器，直接用工厂装饰供给绑定
    let injector = Injector::new();
    let factory = SingletonScopeFactory;

    let provisioning = BindingBuilder::<Database>::bind()
        .provider(|| {
            Ok(Database {
                url: "raw://db".to_string(),
            })
        })
        .unwrap()
        .into_binding()
        .unwrap();
    let scoped = factory.scoped_provider(&provisioning).unwrap();
    let binding = Binding::new(provisioning.key().clone(), scoped);

    let mut modules: Vec<Box<dyn Module>> = vec![Box::new(LambdaModule::new("raw", move |_| {
        Ok(vec![binding.clone()])
    }))];
    injector.configure(&mut modules).unwrap();

    let first = injector.get_instance::<Database>().unwrap();
    let second = injector.get_instance::<Database>().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}
