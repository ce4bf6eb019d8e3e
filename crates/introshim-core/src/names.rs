//! Operation and namespace names of the stable surface

pub const MODULE: &str = "Module";
pub const MEMORY: &str = "Memory";
pub const PROCESS: &str = "Process";
pub const THREAD: &str = "Thread";
pub const KERNEL: &str = "Kernel";

pub const FIND_EXPORT_BY_NAME: &str = "findExportByName";
pub const GET_EXPORT_BY_NAME: &str = "getExportByName";
pub const FIND_SYMBOL_BY_NAME: &str = "findSymbolByName";
pub const GET_SYMBOL_BY_NAME: &str = "getSymbolByName";
pub const FIND_GLOBAL_EXPORT_BY_NAME: &str = "findGlobalExportByName";
pub const GET_GLOBAL_EXPORT_BY_NAME: &str = "getGlobalExportByName";
pub const GET_BASE_ADDRESS: &str = "getBaseAddress";
pub const FIND_BASE_ADDRESS: &str = "findBaseAddress";
pub const ENSURE_INITIALIZED: &str = "ensureInitialized";
pub const ENUMERATE_EXPORTS: &str = "enumerateExports";
pub const ENUMERATE_IMPORTS: &str = "enumerateImports";
pub const ENUMERATE_SYMBOLS: &str = "enumerateSymbols";

pub const SCAN: &str = "scan";
pub const SCAN_SYNC: &str = "scanSync";

pub const ENUMERATE_MODULES: &str = "enumerateModules";
pub const ENUMERATE_THREADS: &str = "enumerateThreads";
pub const ENUMERATE_RANGES: &str = "enumerateRanges";
pub const ENUMERATE_MODULE_RANGES: &str = "enumerateModuleRanges";
