//! Simulated loaded module

use crate::memory::SimMemory;
use introshim_common::{
    module_name_from_path, Error, ExportDetails, HostModule, ImportDetails, ModuleDetails,
    NativePointer, Result, SymbolDetails, SymbolKind, Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A module with fixed export, import and symbol tables, kept in
/// declaration order
#[derive(Debug)]
pub struct SimModule {
    name: String,
    path: String,
    base: u64,
    size: u64,
    memory: SimMemory,
    exports: Vec<ExportDetails>,
    imports: Vec<ImportDetails>,
    symbols: Vec<SymbolDetails>,
    init_count: AtomicUsize,
}

impl SimModule {
    pub fn new(path: &str, base: u64, size: u64, memory: SimMemory) -> Self {
        Self {
            name: module_name_from_path(path).to_string(),
            path: path.to_string(),
            base,
            size,
            memory,
            exports: Vec::new(),
            imports: Vec::new(),
            symbols: Vec::new(),
            init_count: AtomicUsize::new(0),
        }
    }

    /// Add an exported function; exports are also global symbols
    pub fn with_export(mut self, name: &str, address: u64) -> Self {
        self.exports.push(ExportDetails {
            kind: SymbolKind::Function,
            name: name.to_string(),
            address,
        });
        self.symbols.push(SymbolDetails {
            name: name.to_string(),
            address,
            is_global: true,
        });
        self
    }

    /// Add a local symbol that is not exported
    pub fn with_local_symbol(mut self, name: &str, address: u64) -> Self {
        self.symbols.push(SymbolDetails {
            name: name.to_string(),
            address,
            is_global: false,
        });
        self
    }

    pub fn with_import(mut self, name: &str, module: &str, address: u64) -> Self {
        self.imports.push(ImportDetails {
            name: name.to_string(),
            module: module.to_string(),
            address,
        });
        self
    }

    pub fn details(&self) -> ModuleDetails {
        ModuleDetails {
            name: self.name.clone(),
            path: self.path.clone(),
            base: self.base,
            size: self.size,
        }
    }

    /// How many times the initialization barrier ran
    pub fn init_count(&self) -> usize {
        self.init_count.load(Ordering::SeqCst)
    }

    pub fn export_address(&self, name: &str) -> Option<u64> {
        self.exports
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.address)
    }

    fn symbol_address(&self, name: &str) -> Option<u64> {
        self.symbols
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.address)
    }

    fn not_found(&self, name: &str) -> Error {
        Error::SymbolNotFound(format!("{}!{}", self.name, name))
    }
}

impl HostModule for SimModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn base(&self) -> NativePointer {
        self.memory.pointer(self.base)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn find_export_by_name(&self, name: &str) -> Result<Option<NativePointer>> {
        Ok(self.export_address(name).map(|a| self.memory.pointer(a)))
    }

    fn get_export_by_name(&self, name: &str) -> Result<NativePointer> {
        self.find_export_by_name(name)?
            .ok_or_else(|| self.not_found(name))
    }

    fn find_symbol_by_name(&self, name: &str) -> Result<Option<NativePointer>> {
        Ok(self.symbol_address(name).map(|a| self.memory.pointer(a)))
    }

    fn get_symbol_by_name(&self, name: &str) -> Result<NativePointer> {
        self.find_symbol_by_name(name)?
            .ok_or_else(|| self.not_found(name))
    }

    fn enumerate_exports(&self) -> Result<Vec<Value>> {
        Ok(self.exports.iter().cloned().map(Value::from).collect())
    }

    fn enumerate_imports(&self) -> Result<Vec<Value>> {
        Ok(self.imports.iter().cloned().map(Value::from).collect())
    }

    fn enumerate_symbols(&self) -> Result<Vec<Value>> {
        Ok(self.symbols.iter().cloned().map(Value::from).collect())
    }

    fn ensure_initialized(&self) -> Result<()> {
        self.init_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
