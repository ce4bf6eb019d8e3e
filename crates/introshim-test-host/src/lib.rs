//! Synthetic introspection host
//!
//! Offers the same process (two modules, three threads, a handful of memory
//! ranges, a small kernel) behind three API generations:
//!
//! - [`HostShape::Legacy`]: module-scoped lookups, namespace-level typed
//!   accessors, visitor enumerations with `...Sync` twins
//! - [`HostShape::Modern`]: global lookups only, no typed accessors on
//!   `Memory`, collecting enumerations without `...Sync` twins
//! - [`HostShape::Bare`]: no namespaces at all
//!
//! Addresses and names are in [`fixture`].

pub mod memory;
pub mod module;

pub use memory::SimMemory;
pub use module::SimModule;

use introshim_common::{
    module_name_matches, parse_address, AccessorType, Directive, Error, Host, HostModule,
    ModuleDetails, ModuleRef, Namespace, NativePointer, ObjectNamespace, Operation, Protection,
    RangeDetails, Result, ThreadDetails, ThreadState, Value,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Well-known names and addresses of the simulated process
pub mod fixture {
    pub const LIBC: &str = "libc.so";
    pub const LIBC_PATH: &str = "/usr/lib/libc.so";
    pub const LIBC_BASE: u64 = 0x1000;
    pub const MALLOC: u64 = 0x1000;
    pub const FREE: u64 = 0x1080;
    pub const HIDDEN_SYMBOL: &str = "__libc_init_secure";
    pub const HIDDEN_SYMBOL_ADDRESS: u64 = 0x1400;

    pub const APP: &str = "app";
    pub const APP_PATH: &str = "/opt/app/app";
    pub const APP_BASE: u64 = 0x40_0000;
    pub const APP_MAIN: u64 = 0x40_0100;

    pub const KERNEL_IMAGE: &str = "kernel";
    pub const KERNEL_BASE: u64 = 0xffff_8000_0000_0000;

    pub const PROCESS_ID: u64 = 4242;
    pub const ARCH: &str = "x64";
    pub const PAGE_SIZE: u64 = 4096;
    pub const MAIN_THREAD: u64 = 100;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostShape {
    Legacy,
    Modern,
    Bare,
}

struct State {
    memory: SimMemory,
    modules: Vec<Arc<SimModule>>,
    threads: Vec<ThreadDetails>,
    ranges: Vec<RangeDetails>,
    kernel_modules: Vec<ModuleDetails>,
    kernel_ranges: Vec<RangeDetails>,
}

impl State {
    fn standard() -> Self {
        let memory = SimMemory::new();
        let libc = SimModule::new(fixture::LIBC_PATH, fixture::LIBC_BASE, 0x1000, memory.clone())
            .with_export("malloc", fixture::MALLOC)
            .with_export("free", fixture::FREE)
            .with_local_symbol(fixture::HIDDEN_SYMBOL, fixture::HIDDEN_SYMBOL_ADDRESS);
        let app = SimModule::new(fixture::APP_PATH, fixture::APP_BASE, 0x2000, memory.clone())
            .with_export("app_main", fixture::APP_MAIN)
            .with_import("malloc", fixture::LIBC_PATH, fixture::MALLOC)
            .with_import("free", fixture::LIBC_PATH, fixture::FREE);

        let threads = [
            (fixture::MAIN_THREAD, Some("main"), ThreadState::Running),
            (101, Some("worker"), ThreadState::Waiting),
            (102, None, ThreadState::Stopped),
        ]
        .into_iter()
        .map(|(id, name, state)| ThreadDetails {
            id,
            name: name.map(str::to_string),
            state,
        })
        .collect();

        let range = |base: u64, size: u64, protection: &str, file: Option<&str>| RangeDetails {
            base,
            size,
            protection: protection.to_string(),
            file: file.map(str::to_string),
        };
        let ranges = vec![
            range(fixture::LIBC_BASE, 0x1000, "r-x", Some(fixture::LIBC_PATH)),
            range(0x2000, 0x6000, "rw-", None),
            range(fixture::APP_BASE, 0x1000, "r-x", Some(fixture::APP_PATH)),
            range(fixture::APP_BASE + 0x1000, 0x1000, "rw-", Some(fixture::APP_PATH)),
            range(0x7fff_0000, 0x2_0000, "rw-", None),
        ];

        let kernel_modules = vec![
            ModuleDetails {
                name: fixture::KERNEL_IMAGE.to_string(),
                path: fixture::KERNEL_IMAGE.to_string(),
                base: fixture::KERNEL_BASE,
                size: 0x100_0000,
            },
            ModuleDetails {
                name: "netfilter.ko".to_string(),
                path: "/lib/modules/netfilter.ko".to_string(),
                base: fixture::KERNEL_BASE + 0x200_0000,
                size: 0x1_0000,
            },
        ];
        let kernel_ranges = vec![
            range(fixture::KERNEL_BASE, 0x80_0000, "r-x", None),
            range(fixture::KERNEL_BASE + 0x80_0000, 0x80_0000, "rw-", None),
            range(fixture::KERNEL_BASE + 0x200_0000, 0x1_0000, "r-x", None),
        ];

        Self {
            memory,
            modules: vec![Arc::new(libc), Arc::new(app)],
            threads,
            ranges,
            kernel_modules,
            kernel_ranges,
        }
    }

    fn find_module(&self, query: &str) -> Option<&Arc<SimModule>> {
        self.modules
            .iter()
            .find(|m| module_name_matches(m.name(), m.path(), query))
    }

    fn global_export(&self, symbol: &str) -> Option<NativePointer> {
        self.modules
            .iter()
            .find_map(|m| m.export_address(symbol))
            .map(|address| self.memory.pointer(address))
    }

    fn ptr(&self, value: &Value) -> Result<NativePointer> {
        match value {
            Value::Pointer(p) => Ok(p.clone()),
            other => Ok(self.memory.pointer(parse_address(other)?)),
        }
    }

    fn process_modules(&self) -> Vec<Value> {
        self.modules.iter().map(|m| Value::from(m.details())).collect()
    }

    fn threads(&self) -> Vec<Value> {
        self.threads.iter().cloned().map(Value::from).collect()
    }

    fn ranges_with(ranges: &[RangeDetails], filter: Option<&Value>) -> Vec<Value> {
        let required = filter
            .and_then(Value::as_str)
            .map(Protection::parse)
            .unwrap_or(Protection::new(false, false, false));
        ranges
            .iter()
            .filter(|r| Protection::parse(&r.protection).satisfies(&required))
            .cloned()
            .map(Value::from)
            .collect()
    }

    fn kernel_modules(&self) -> Vec<Value> {
        self.kernel_modules.iter().cloned().map(Value::from).collect()
    }

    /// Kernel ranges inside the module named by the first argument
    fn kernel_module_ranges(&self, args: &[Value]) -> Vec<Value> {
        let module = args
            .first()
            .and_then(Value::as_str)
            .and_then(|name| self.kernel_modules.iter().find(|m| m.name == name));
        let inside: Vec<RangeDetails> = self
            .kernel_ranges
            .iter()
            .filter(|r| match module {
                Some(m) => r.base >= m.base && r.base < m.base + m.size,
                None => true,
            })
            .cloned()
            .collect();
        Self::ranges_with(&inside, args.get(1))
    }
}

type Listing = Arc<dyn Fn(&State, &[Value]) -> Result<Vec<Value>> + Send + Sync>;

fn listing<F>(f: F) -> Listing
where
    F: Fn(&State, &[Value]) -> Result<Vec<Value>> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Legacy visitor enumeration: trailing visitor required
fn visitor_op(state: &Arc<State>, list: Listing) -> Operation {
    let state = Arc::clone(state);
    Operation::visitor(move |args| {
        let (visitor, filters) = match args.split_last() {
            Some((Value::Visitor(visitor), rest)) => (visitor, rest),
            _ => {
                return Err(Error::InvalidArgument(
                    "visitor enumeration expects callbacks".into(),
                ))
            }
        };
        for element in list(&*state, filters)? {
            if visitor.on_match(&element) == Directive::Stop {
                return Ok(Value::Null);
            }
        }
        visitor.on_complete();
        Ok(Value::Null)
    })
}

fn collecting_op(state: &Arc<State>, list: Listing) -> Operation {
    let state = Arc::clone(state);
    Operation::collecting(move |args| Ok(Value::Array(list(&*state, args)?)))
}

fn plain_op<F>(state: &Arc<State>, f: F) -> Operation
where
    F: Fn(&State, &[Value]) -> Result<Value> + Send + Sync + 'static,
{
    let state = Arc::clone(state);
    Operation::plain(move |args| f(&*state, args))
}

fn symbol_arg(args: &[Value]) -> Result<&str> {
    args.get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument("expected a symbol name".into()))
}

fn module_arg<'a>(state: &'a State, args: &[Value]) -> Result<&'a Arc<SimModule>> {
    let name = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument("expected a module name".into()))?;
    state
        .find_module(name)
        .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
}

fn legacy_module(state: &Arc<State>) -> ObjectNamespace {
    ObjectNamespace::new("Module")
        .with_operation(
            "findExportByName",
            plain_op(state, |state, args| {
                let symbol = symbol_arg(args)?;
                match args.first().and_then(Value::as_str) {
                    None => Ok(state.global_export(symbol).into()),
                    Some(_) => Ok(module_arg(state, args)?.find_export_by_name(symbol)?.into()),
                }
            }),
        )
        .with_operation(
            "getExportByName",
            plain_op(state, |state, args| {
                let symbol = symbol_arg(args)?;
                match args.first().and_then(Value::as_str) {
                    None => state
                        .global_export(symbol)
                        .map(Value::Pointer)
                        .ok_or_else(|| Error::SymbolNotFound(symbol.to_string())),
                    Some(_) => Ok(module_arg(state, args)?.get_export_by_name(symbol)?.into()),
                }
            }),
        )
        .with_operation(
            "findSymbolByName",
            plain_op(state, |state, args| {
                Ok(module_arg(state, args)?
                    .find_symbol_by_name(symbol_arg(args)?)?
                    .into())
            }),
        )
        .with_operation(
            "getSymbolByName",
            plain_op(state, |state, args| {
                Ok(module_arg(state, args)?
                    .get_symbol_by_name(symbol_arg(args)?)?
                    .into())
            }),
        )
        .with_operation(
            "findBaseAddress",
            plain_op(state, |state, args| {
                Ok(module_arg(state, args)
                    .map(|m| Value::Pointer(m.base()))
                    .unwrap_or(Value::Null))
            }),
        )
        .with_operation(
            "getBaseAddress",
            plain_op(state, |state, args| Ok(module_arg(state, args)?.base().into())),
        )
        .with_operation(
            "ensureInitialized",
            plain_op(state, |state, args| {
                module_arg(state, args)?.ensure_initialized()?;
                Ok(Value::Null)
            }),
        )
        .with_operation(
            "enumerateExports",
            visitor_op(state, listing(|state, args| module_arg(state, args)?.enumerate_exports())),
        )
        .with_operation(
            "enumerateImports",
            visitor_op(state, listing(|state, args| module_arg(state, args)?.enumerate_imports())),
        )
        .with_operation(
            "enumerateSymbols",
            visitor_op(state, listing(|state, args| module_arg(state, args)?.enumerate_symbols())),
        )
}

fn modern_module(state: &Arc<State>) -> ObjectNamespace {
    ObjectNamespace::new("Module")
        .with_operation(
            "findGlobalExportByName",
            plain_op(state, |state, args| {
                let symbol = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidArgument("expected a symbol name".into()))?;
                Ok(state.global_export(symbol).into())
            }),
        )
        .with_operation(
            "getGlobalExportByName",
            plain_op(state, |state, args| {
                let symbol = args
                    .first()
                    .and_then(Value::as_str)
                    .ok_or_else(|| Error::InvalidArgument("expected a symbol name".into()))?;
                state
                    .global_export(symbol)
                    .map(Value::Pointer)
                    .ok_or_else(|| Error::SymbolNotFound(symbol.to_string()))
            }),
        )
}

fn scan_matches(state: &State, args: &[Value]) -> Result<Vec<Value>> {
    let address = state.ptr(args.first().unwrap_or(&Value::Null))?.address();
    let size = args
        .get(1)
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::InvalidArgument("scan expects a size".into()))?;
    let pattern = args
        .get(2)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument("scan expects a pattern".into()))?;
    Ok(state
        .memory
        .scan(address, size, pattern)?
        .into_iter()
        .map(Value::from)
        .collect())
}

fn legacy_memory(state: &Arc<State>) -> ObjectNamespace {
    let mut ns = ObjectNamespace::new("Memory")
        .with_operation("scan", visitor_op(state, listing(scan_matches)))
        .with_operation("scanSync", collecting_op(state, listing(scan_matches)));
    for ty in AccessorType::ALL {
        ns = ns
            .with_operation(
                &ty.read_name(),
                plain_op(state, move |state, args| {
                    let (address, extra) = args
                        .split_first()
                        .ok_or_else(|| Error::InvalidArgument("expected an address".into()))?;
                    state.ptr(address)?.read(ty, extra)
                }),
            )
            .with_operation(
                &ty.write_name(),
                plain_op(state, move |state, args| match args {
                    [address, value, extra @ ..] => {
                        state.ptr(address)?.write(ty, value, extra)?;
                        Ok(Value::Null)
                    }
                    _ => Err(Error::InvalidArgument("expected an address and a value".into())),
                }),
            );
    }
    ns
}

fn modern_memory(state: &Arc<State>) -> ObjectNamespace {
    ObjectNamespace::new("Memory").with_operation("scan", collecting_op(state, listing(scan_matches)))
}

fn process_base(state: &Arc<State>) -> ObjectNamespace {
    ObjectNamespace::new("Process")
        .with_read_only("id", fixture::PROCESS_ID)
        .with_read_only("arch", fixture::ARCH)
        .with_property("pageSize", fixture::PAGE_SIZE)
        .with_operation(
            "getCurrentThreadId",
            plain_op(state, |_, _| Ok(Value::UInt(fixture::MAIN_THREAD))),
        )
}

fn process_modules(state: &State, _: &[Value]) -> Result<Vec<Value>> {
    Ok(state.process_modules())
}

fn process_threads(state: &State, _: &[Value]) -> Result<Vec<Value>> {
    Ok(state.threads())
}

fn process_ranges(state: &State, args: &[Value]) -> Result<Vec<Value>> {
    Ok(State::ranges_with(&state.ranges, args.first()))
}

fn kernel_modules(state: &State, _: &[Value]) -> Result<Vec<Value>> {
    Ok(state.kernel_modules())
}

fn kernel_ranges(state: &State, args: &[Value]) -> Result<Vec<Value>> {
    Ok(State::ranges_with(&state.kernel_ranges, args.first()))
}

fn kernel_module_ranges(state: &State, args: &[Value]) -> Result<Vec<Value>> {
    Ok(state.kernel_module_ranges(args))
}

fn legacy_process(state: &Arc<State>) -> ObjectNamespace {
    process_base(state)
        .with_operation("enumerateModules", visitor_op(state, listing(process_modules)))
        .with_operation("enumerateModulesSync", collecting_op(state, listing(process_modules)))
        .with_operation("enumerateThreads", visitor_op(state, listing(process_threads)))
        .with_operation("enumerateThreadsSync", collecting_op(state, listing(process_threads)))
        .with_operation("enumerateRanges", visitor_op(state, listing(process_ranges)))
        .with_operation("enumerateRangesSync", collecting_op(state, listing(process_ranges)))
}

fn modern_process(state: &Arc<State>) -> ObjectNamespace {
    process_base(state)
        .with_operation("enumerateModules", collecting_op(state, listing(process_modules)))
        .with_operation("enumerateThreads", collecting_op(state, listing(process_threads)))
        .with_operation("enumerateRanges", collecting_op(state, listing(process_ranges)))
}

fn legacy_kernel(state: &Arc<State>) -> ObjectNamespace {
    ObjectNamespace::new("Kernel")
        .with_read_only("available", true)
        .with_operation("enumerateModules", visitor_op(state, listing(kernel_modules)))
        .with_operation("enumerateModulesSync", collecting_op(state, listing(kernel_modules)))
        .with_operation("enumerateRanges", visitor_op(state, listing(kernel_ranges)))
        .with_operation("enumerateRangesSync", collecting_op(state, listing(kernel_ranges)))
        // no Sync twin in this generation
        .with_operation("enumerateModuleRanges", visitor_op(state, listing(kernel_module_ranges)))
}

fn modern_kernel(state: &Arc<State>) -> ObjectNamespace {
    ObjectNamespace::new("Kernel")
        .with_read_only("available", true)
        .with_operation("enumerateModules", collecting_op(state, listing(kernel_modules)))
        .with_operation("enumerateRanges", collecting_op(state, listing(kernel_ranges)))
}

fn thread_namespace() -> ObjectNamespace {
    ObjectNamespace::new("Thread").with_operation("sleep", Operation::plain(|_| Ok(Value::Null)))
}

fn gum_interceptor() -> ObjectNamespace {
    ObjectNamespace::new("Gum.Interceptor")
        .with_operation("attach", Operation::plain(|_| Ok(Value::Null)))
        .with_operation("detachAll", Operation::plain(|_| Ok(Value::Null)))
}

pub struct TestHostBuilder {
    shape: HostShape,
    gum_interceptor: bool,
}

impl TestHostBuilder {
    /// Expose `Interceptor` only as `Gum.Interceptor`
    pub fn with_gum_interceptor(mut self) -> Self {
        self.gum_interceptor = true;
        self
    }

    pub fn build(self) -> TestHost {
        let state = Arc::new(State::standard());
        let mut namespaces: BTreeMap<String, Arc<dyn Namespace>> = BTreeMap::new();
        let built: Vec<ObjectNamespace> = match self.shape {
            HostShape::Legacy => vec![
                legacy_module(&state),
                legacy_memory(&state),
                legacy_process(&state),
                legacy_kernel(&state),
                thread_namespace(),
            ],
            HostShape::Modern => vec![
                modern_module(&state),
                modern_memory(&state),
                modern_process(&state),
                modern_kernel(&state),
                thread_namespace(),
            ],
            HostShape::Bare => Vec::new(),
        };
        for ns in built {
            namespaces.insert(ns.name().to_string(), Arc::new(ns));
        }
        if self.gum_interceptor {
            namespaces.insert("Gum.Interceptor".to_string(), Arc::new(gum_interceptor()));
        }

        tracing::debug!(
            target: "introshim_test_host",
            shape = ?self.shape,
            namespaces = namespaces.len(),
            "Test host ready"
        );

        TestHost {
            shape: self.shape,
            state,
            namespaces,
        }
    }
}

/// In-memory host used by the shim's tests
pub struct TestHost {
    shape: HostShape,
    state: Arc<State>,
    namespaces: BTreeMap<String, Arc<dyn Namespace>>,
}

impl TestHost {
    pub fn new(shape: HostShape) -> Self {
        Self::builder(shape).build()
    }

    pub fn builder(shape: HostShape) -> TestHostBuilder {
        TestHostBuilder {
            shape,
            gum_interceptor: false,
        }
    }

    pub fn shape(&self) -> HostShape {
        self.shape
    }

    pub fn memory(&self) -> &SimMemory {
        &self.state.memory
    }

    pub fn module(&self, query: &str) -> Option<Arc<SimModule>> {
        self.state.find_module(query).cloned()
    }
}

impl Host for TestHost {
    fn namespace(&self, name: &str) -> Option<Arc<dyn Namespace>> {
        self.namespaces.get(name).cloned()
    }

    fn module_by_name(&self, name: &str) -> Result<ModuleRef> {
        self.state
            .find_module(name)
            .map(|m| ModuleRef::new(Arc::clone(m) as Arc<dyn HostModule>))
            .ok_or_else(|| Error::ModuleNotFound(name.to_string()))
    }

    fn ptr(&self, value: &Value) -> Result<NativePointer> {
        self.state.ptr(value)
    }
}
