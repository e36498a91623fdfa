use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::cl::internal_error;
use crate::exec::kind::Kind;
use crate::exec::spec::{
    Comprehension, ForPhrase, FuncInfo, GoConstInfo, GoFuncAddr, GoFuncInfo, GoFuncvAddr,
    GoPackage, GoVarAddr, Interface, Label, SymbolKind, Var,
};
use crate::exec::types::Type;
use crate::lang::value::Value;

/// A native package: named functions, variables, types and constants.
#[derive(Debug, Default)]
pub struct Package {
    pkg_path: String,
    syms: HashMap<String, (u32, SymbolKind)>,
    types: HashMap<String, Type>,
    consts: HashMap<String, GoConstInfo>,
}

impl Package {
    fn new(pkg_path: &str) -> Self {
        Self {
            pkg_path: pkg_path.to_string(),
            ..Self::default()
        }
    }

    pub fn find_func(&self, name: &str) -> Option<GoFuncAddr> {
        match self.syms.get(name) {
            Some(&(addr, SymbolKind::Func)) => Some(GoFuncAddr(addr)),
            _ => None,
        }
    }

    pub fn find_funcv(&self, name: &str) -> Option<GoFuncvAddr> {
        match self.syms.get(name) {
            Some(&(addr, SymbolKind::Funcv)) => Some(GoFuncvAddr(addr)),
            _ => None,
        }
    }

    pub fn find_var(&self, name: &str) -> Option<GoVarAddr> {
        match self.syms.get(name) {
            Some(&(addr, SymbolKind::Var)) => Some(GoVarAddr(addr)),
            _ => None,
        }
    }
}

impl GoPackage for Package {
    fn pkg_path(&self) -> &str {
        &self.pkg_path
    }

    fn find(&self, name: &str) -> Option<(u32, SymbolKind)> {
        self.syms.get(name).copied()
    }

    fn find_type(&self, name: &str) -> Option<Type> {
        self.types.get(name).cloned()
    }

    fn find_const(&self, name: &str) -> Option<&GoConstInfo> {
        self.consts.get(name)
    }
}

#[derive(Debug, Default)]
struct Tables {
    funcs: Vec<GoFuncInfo>,
    funcvs: Vec<GoFuncInfo>,
    vars: Vec<GoFuncInfo>,
}

/// Registry of native packages, shared read-only by every builder.
///
/// Built once with [`Registry::builder`]; afterwards only handle ids are
/// allocated, atomically.
#[derive(Debug)]
pub struct Registry {
    packages: HashMap<String, Arc<Package>>,
    tables: Tables,
    next_id: AtomicU32,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Concrete package by path.
    pub fn package(&self, pkg_path: &str) -> Option<&Arc<Package>> {
        self.packages.get(pkg_path)
    }

    pub fn get_go_var_info(&self, addr: GoVarAddr) -> &GoFuncInfo {
        lookup(&self.tables.vars, addr.0, "variable")
    }

    fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

fn lookup<'a>(table: &'a [GoFuncInfo], addr: u32, what: &str) -> &'a GoFuncInfo {
    match table.get(addr as usize) {
        Some(info) => info,
        None => internal_error(format!("no native {} at address {}", what, addr)),
    }
}

impl Interface for Registry {
    fn new_var(&self, ty: Type, name: &str) -> Var {
        Var::new(self.next_id(), ty, name)
    }

    fn new_label(&self, name: &str) -> Label {
        Label::new(self.next_id(), name)
    }

    fn new_for_phrase(&self, container: Type) -> ForPhrase {
        ForPhrase::new(self.next_id(), container)
    }

    fn new_comprehension(&self, out: Type) -> Comprehension {
        Comprehension::new(self.next_id(), out)
    }

    fn new_func(&self, name: &str, nest_depth: u32) -> FuncInfo {
        FuncInfo::new(self.next_id(), name, nest_depth)
    }

    fn find_go_package(&self, pkg_path: &str) -> Option<Arc<dyn GoPackage>> {
        self.packages
            .get(pkg_path)
            .map(|pkg| Arc::clone(pkg) as Arc<dyn GoPackage>)
    }

    fn get_go_func_type(&self, addr: GoFuncAddr) -> Type {
        self.get_go_func_info(addr).ty.clone()
    }

    fn get_go_funcv_type(&self, addr: GoFuncvAddr) -> Type {
        self.get_go_funcv_info(addr).ty.clone()
    }

    fn get_go_func_info(&self, addr: GoFuncAddr) -> &GoFuncInfo {
        lookup(&self.tables.funcs, addr.0, "function")
    }

    fn get_go_funcv_info(&self, addr: GoFuncvAddr) -> &GoFuncInfo {
        lookup(&self.tables.funcvs, addr.0, "variadic function")
    }
}

/// Collects packages before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    packages: HashMap<String, Package>,
    tables: Tables,
}

impl RegistryBuilder {
    /// Register symbols of `pkg_path`; calling it again for the same path extends the package.
    pub fn package(mut self, pkg_path: &str, define: impl FnOnce(&mut PackageBuilder<'_>)) -> Self {
        let pkg = self
            .packages
            .remove(pkg_path)
            .unwrap_or_else(|| Package::new(pkg_path));
        let mut builder = PackageBuilder {
            tables: &mut self.tables,
            pkg,
        };
        define(&mut builder);
        let pkg = builder.pkg;
        self.packages.insert(pkg_path.to_string(), pkg);
        self
    }

    pub fn build(self) -> Arc<Registry> {
        tracing::debug!(
            packages = self.packages.len(),
            funcs = self.tables.funcs.len(),
            funcvs = self.tables.funcvs.len(),
            "native registry built"
        );
        Arc::new(Registry {
            packages: self
                .packages
                .into_iter()
                .map(|(path, pkg)| (path, Arc::new(pkg)))
                .collect(),
            tables: self.tables,
            next_id: AtomicU32::new(1),
        })
    }
}

/// Adds symbols to one package.
pub struct PackageBuilder<'a> {
    tables: &'a mut Tables,
    pkg: Package,
}

impl PackageBuilder<'_> {
    fn symbol(&mut self, name: &str, ty: Type, kind: SymbolKind) -> u32 {
        let table = match kind {
            SymbolKind::Func => &mut self.tables.funcs,
            SymbolKind::Funcv => &mut self.tables.funcvs,
            SymbolKind::Var => &mut self.tables.vars,
        };
        let addr = table.len() as u32;
        table.push(GoFuncInfo {
            pkg_path: self.pkg.pkg_path.clone(),
            name: name.to_string(),
            ty,
        });
        if self.pkg.syms.insert(name.to_string(), (addr, kind)).is_some() {
            tracing::warn!(pkg = %self.pkg.pkg_path, name, "native symbol redefined");
        }
        addr
    }

    pub fn func(&mut self, name: &str, ty: Type) -> GoFuncAddr {
        GoFuncAddr(self.symbol(name, ty, SymbolKind::Func))
    }

    /// Register a variadic function; `ty` must be a variadic function type.
    pub fn funcv(&mut self, name: &str, ty: Type) -> GoFuncvAddr {
        if !ty.is_variadic() {
            internal_error(format!("funcv {}: {} is not variadic", name, ty));
        }
        GoFuncvAddr(self.symbol(name, ty, SymbolKind::Funcv))
    }

    pub fn var(&mut self, name: &str, ty: Type) -> GoVarAddr {
        GoVarAddr(self.symbol(name, ty, SymbolKind::Var))
    }

    /// Register a named type. `underlying` becomes the underlying type of the new named type.
    pub fn ty(&mut self, name: &str, underlying: Type) -> Type {
        let t = Type::named(self.pkg.pkg_path.clone(), name, underlying);
        self.pkg.types.insert(name.to_string(), t.clone());
        t
    }

    /// Register a constant. `kind` is an unbound marker for untyped constants.
    pub fn konst(&mut self, name: &str, kind: Kind, value: Value) {
        let info = GoConstInfo {
            pkg_path: self.pkg.pkg_path.clone(),
            name: name.to_string(),
            kind,
            value,
        };
        self.pkg.consts.insert(name.to_string(), info);
    }
}
