// Copyright (c) 2025 knix
// All rights reserved.

//! Base type infos and the table that owns them.

use std::fmt::Write;

use fxhash::{FxHashMap, FxHashSet};
use itertools::Itertools;
use log::{debug, info};

use crate::config::RuntimeConfig;
use crate::dispatch::{SpecialPreds, builtins};
use crate::error::{ErrorKind, RttiResult};
use crate::layout::{
    BuiltinKind, LayoutEntry, LayoutView, TypeFunctors, TypeLayout, assign, classify,
};
use crate::names::{Name, Names};
use crate::pool::Pool;
use crate::tags::TagBits;
use crate::typeclass::{BaseTypeclassId, BaseTypeclassInfo, ProcAddr};
use crate::typeinfo::{HigherOrderKind, PseudoTypeInfo, TypeCtorId, TypeInfo};
use crate::{SV4, SV8, failf};

pub const BUILTIN_MODULE: &str = "builtin";

/// Equivalence chains longer than this are rejected as cyclic
const MAX_EQUIV_CHAIN: usize = 64;
/// Nor may an expansion grow past this many type constructors
const MAX_EQUIV_NODES: usize = 4096;

fn type_info_nodes(ti: &TypeInfo) -> usize {
    1 + ti.args().iter().map(type_info_nodes).sum::<usize>()
}

/// Everything the runtime knows about one type constructor.
#[derive(Debug, Clone)]
pub struct BaseTypeInfo {
    pub module_name: Name,
    pub type_name: Name,
    pub arity: u32,
    pub special: SpecialPreds,
    pub layout: TypeLayout,
    pub functors: TypeFunctors,
}

impl BaseTypeInfo {
    pub fn classify(&self, tag: u32) -> LayoutView<'_> {
        classify(&self.layout, &self.functors, tag)
    }

    pub fn is_equiv(&self) -> bool {
        matches!(self.functors, TypeFunctors::Equiv(_))
    }
}

/// Constructors of the builtin types, registered by every table.
#[derive(Debug, Clone, Copy)]
pub struct Builtins {
    pub int: TypeCtorId,
    pub character: TypeCtorId,
    pub float: TypeCtorId,
    pub string: TypeCtorId,
    pub univ: TypeCtorId,
    pub pred: TypeCtorId,
    pub func: TypeCtorId,
    pub void: TypeCtorId,
    pub array: TypeCtorId,
    pub type_info: TypeCtorId,
    pub c_pointer: TypeCtorId,
}

impl Builtins {
    pub fn higher_order(&self, kind: HigherOrderKind) -> TypeCtorId {
        match kind {
            HigherOrderKind::Pred => self.pred,
            HigherOrderKind::Func => self.func,
        }
    }

    pub fn higher_order_kind(&self, ctor: TypeCtorId) -> Option<HigherOrderKind> {
        if ctor == self.pred {
            Some(HigherOrderKind::Pred)
        } else if ctor == self.func {
            Some(HigherOrderKind::Func)
        } else {
            None
        }
    }
}

pub struct TypeTable {
    pub config: RuntimeConfig,
    pub names: Names,
    pub builtins: Builtins,
    ctors: Pool<BaseTypeInfo, TypeCtorId>,
    by_name: FxHashMap<(Name, Name, u32), TypeCtorId>,
    typeclass_bases: Pool<BaseTypeclassInfo, BaseTypeclassId>,
}

impl TypeTable {
    pub fn tag_bits(&self) -> TagBits {
        self.config.tag_bits
    }

    pub fn ctor(&self, id: TypeCtorId) -> &BaseTypeInfo {
        self.ctors.get(id)
    }

    pub fn try_ctor(&self, id: TypeCtorId) -> Option<&BaseTypeInfo> {
        self.ctors.try_get(id)
    }

    pub fn ctor_count(&self) -> usize {
        self.ctors.len()
    }

    pub fn iter_ctors(&self) -> impl Iterator<Item = (TypeCtorId, &BaseTypeInfo)> {
        self.ctors.iter_with_ids()
    }

    pub fn name(&self, name: Name) -> &str {
        self.names.get(name)
    }

    pub fn lookup(&self, module_name: &str, type_name: &str, arity: u32) -> Option<TypeCtorId> {
        let module_name = self.names.find(module_name)?;
        let type_name = self.names.find(type_name)?;
        self.by_name.get(&(module_name, type_name, arity)).copied()
    }

    pub fn typeclass_base(&self, id: BaseTypeclassId) -> &BaseTypeclassInfo {
        self.typeclass_bases.get(id)
    }

    pub fn try_typeclass_base(&self, id: BaseTypeclassId) -> Option<&BaseTypeclassInfo> {
        self.typeclass_bases.try_get(id)
    }

    /// Follows equivalences until `ti` names a constructor with a real layout.
    pub fn expand_equivs(&self, ti: &TypeInfo) -> TypeInfo {
        let mut ti = ti.clone();
        for _ in 0..MAX_EQUIV_CHAIN {
            let Some(ctor) = ti.as_ctor() else { return ti };
            let TypeFunctors::Equiv(target) = &self.ctor(ctor).functors else { return ti };
            match target.instantiate(ti.args()) {
                Some(expanded) => ti = expanded,
                None => panic!("equivalence for {} mentions an unbound type variable", self.type_info_to_string(&ti)),
            }
        }
        panic!("equivalence chain too long at {}", self.type_info_to_string(&ti))
    }

    pub fn type_info_to_string(&self, ti: &TypeInfo) -> String {
        let mut s = String::with_capacity(64);
        self.display_type_info(ti, &mut s).unwrap();
        s
    }

    pub fn display_type_info(&self, ti: &TypeInfo, writ: &mut impl Write) -> std::fmt::Result {
        match ti {
            TypeInfo::Ctor { ctor, args } => {
                let base = self.ctor(*ctor);
                let module_name = self.name(base.module_name);
                if module_name != BUILTIN_MODULE {
                    writ.write_str(module_name)?;
                    writ.write_str(".")?;
                }
                writ.write_str(self.name(base.type_name))?;
                if !args.is_empty() {
                    writ.write_str("(")?;
                    self.display_type_info_list(args, writ)?;
                    writ.write_str(")")?;
                }
                Ok(())
            }
            TypeInfo::HigherOrder { kind: HigherOrderKind::Pred, args } => {
                writ.write_str("pred")?;
                if !args.is_empty() {
                    writ.write_str("(")?;
                    self.display_type_info_list(args, writ)?;
                    writ.write_str(")")?;
                }
                Ok(())
            }
            TypeInfo::HigherOrder { kind: HigherOrderKind::Func, args } => {
                let Some((ret, params)) = args.split_last() else {
                    return writ.write_str("func");
                };
                writ.write_str("func")?;
                if !params.is_empty() {
                    writ.write_str("(")?;
                    self.display_type_info_list(params, writ)?;
                    writ.write_str(")")?;
                }
                writ.write_str(" = ")?;
                self.display_type_info(ret, writ)
            }
        }
    }

    fn display_type_info_list(&self, tis: &[TypeInfo], writ: &mut impl Write) -> std::fmt::Result {
        for (index, ti) in tis.iter().enumerate() {
            if index > 0 {
                writ.write_str(", ")?;
            }
            self.display_type_info(ti, writ)?;
        }
        Ok(())
    }

    pub fn pseudo_to_string(&self, pti: &PseudoTypeInfo) -> String {
        match pti {
            PseudoTypeInfo::Var(n) => format!("T{n}"),
            PseudoTypeInfo::Ctor { ctor, args } => {
                let base = self.ctor(*ctor);
                let module_name = self.name(base.module_name);
                let mut s = if module_name == BUILTIN_MODULE {
                    self.name(base.type_name).to_string()
                } else {
                    format!("{}.{}", module_name, self.name(base.type_name))
                };
                if !args.is_empty() {
                    write!(s, "({})", args.iter().map(|a| self.pseudo_to_string(a)).join(", ")).unwrap();
                }
                s
            }
            PseudoTypeInfo::HigherOrder { kind, args } => {
                format!("{}({})", kind.name(), args.iter().map(|a| self.pseudo_to_string(a)).join(", "))
            }
        }
    }
}

/// A constructor declaration: name and argument types, which may mention
/// the type's parameters as variables `1..=arity`.
#[derive(Debug, Clone)]
pub struct CtorDecl {
    pub name: String,
    pub args: SV4<PseudoTypeInfo>,
}

impl CtorDecl {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = PseudoTypeInfo>) -> CtorDecl {
        CtorDecl { name: name.into(), args: args.into_iter().collect() }
    }

    pub fn constant(name: impl Into<String>) -> CtorDecl {
        CtorDecl { name: name.into(), args: SV4::new() }
    }
}

/// Builds a [`TypeTable`]: the builtin constructors are registered up front,
/// user constructors are declared, then defined, then the table is frozen.
pub struct TypeTableBuilder {
    table: TypeTable,
    undefined: FxHashSet<TypeCtorId>,
}

impl TypeTableBuilder {
    pub fn new(config: RuntimeConfig) -> TypeTableBuilder {
        let mut names = Names::default();
        let mut ctors: Pool<BaseTypeInfo, TypeCtorId> = Pool::with_capacity("type_ctors", 64);
        let mut by_name: FxHashMap<(Name, Name, u32), TypeCtorId> = FxHashMap::default();
        let bits = config.tag_bits;

        let mut add = |module: &str, name: &str, arity: u32, kind: BuiltinKind, special: SpecialPreds| {
            let module_name = names.intern(module);
            let type_name = names.intern(name);
            let functors = if kind == BuiltinKind::Univ { TypeFunctors::Univ } else { TypeFunctors::Special };
            let id = ctors.add(BaseTypeInfo {
                module_name,
                type_name,
                arity,
                special: if config.extended_special_preds { special } else { special.without_conversions() },
                layout: TypeLayout { entries: bits.for_all_tags(LayoutEntry::Builtin(kind)), constants: None },
                functors,
            });
            by_name.insert((module_name, type_name, arity), id);
            id
        };

        let builtins = Builtins {
            int: add(BUILTIN_MODULE, "int", 0, BuiltinKind::Int, builtins::INT),
            character: add(BUILTIN_MODULE, "character", 0, BuiltinKind::Character, builtins::CHARACTER),
            float: add(BUILTIN_MODULE, "float", 0, BuiltinKind::Float, builtins::FLOAT),
            string: add(BUILTIN_MODULE, "string", 0, BuiltinKind::String, builtins::STRING),
            univ: add(BUILTIN_MODULE, "univ", 0, BuiltinKind::Univ, builtins::UNIV),
            pred: add(BUILTIN_MODULE, "pred", 0, BuiltinKind::Predicate, builtins::HIGHER_ORDER),
            func: add(BUILTIN_MODULE, "func", 0, BuiltinKind::Predicate, builtins::HIGHER_ORDER),
            void: add(BUILTIN_MODULE, "void", 0, BuiltinKind::Void, builtins::VOID),
            array: add("array", "array", 1, BuiltinKind::Array, builtins::ARRAY),
            type_info: add(BUILTIN_MODULE, "type_info", 0, BuiltinKind::TypeInfo, builtins::TYPE_INFO),
            c_pointer: add(BUILTIN_MODULE, "c_pointer", 0, BuiltinKind::CPointer, builtins::C_POINTER),
        };

        TypeTableBuilder {
            table: TypeTable {
                config,
                names,
                builtins,
                ctors,
                by_name,
                typeclass_bases: Pool::new("typeclass_bases"),
            },
            undefined: FxHashSet::default(),
        }
    }

    pub fn builtins(&self) -> Builtins {
        self.table.builtins
    }

    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    pub fn declare(&mut self, module_name: &str, type_name: &str, arity: u32) -> RttiResult<TypeCtorId> {
        let module = self.table.names.intern(module_name);
        let name = self.table.names.intern(type_name);
        if self.table.by_name.contains_key(&(module, name, arity)) {
            return failf!(ErrorKind::Table, "type {module_name}.{type_name}/{arity} declared twice");
        }
        let id = self.table.ctors.add(BaseTypeInfo {
            module_name: module,
            type_name: name,
            arity,
            special: SpecialPreds::GENERIC,
            layout: TypeLayout {
                entries: self.table.config.tag_bits.for_all_tags(LayoutEntry::Unassigned),
                constants: None,
            },
            functors: TypeFunctors::Special,
        });
        self.table.by_name.insert((module, name, arity), id);
        self.undefined.insert(id);
        debug!("declared {module_name}.{type_name}/{arity} as {id}");
        Ok(id)
    }

    fn qualified_name(&self, id: TypeCtorId) -> String {
        let base = self.table.ctor(id);
        format!("{}.{}/{}", self.table.name(base.module_name), self.table.name(base.type_name), base.arity)
    }

    fn check_undefined(&self, id: TypeCtorId) -> RttiResult<()> {
        if self.table.try_ctor(id).is_none() {
            return failf!(ErrorKind::Table, "unknown type constructor {id}");
        }
        if !self.undefined.contains(&id) {
            return failf!(ErrorKind::Table, "type {} is already defined", self.qualified_name(id));
        }
        Ok(())
    }

    fn check_pseudo(&self, owner: TypeCtorId, pti: &PseudoTypeInfo) -> RttiResult<()> {
        let owner_arity = self.table.ctor(owner).arity;
        match pti {
            PseudoTypeInfo::Var(n) => {
                if *n == 0 || *n > owner_arity {
                    return failf!(
                        ErrorKind::Table,
                        "type variable T{n} is out of range for {}",
                        self.qualified_name(owner)
                    );
                }
                Ok(())
            }
            PseudoTypeInfo::Ctor { ctor, args } => {
                let Some(base) = self.table.try_ctor(*ctor) else {
                    return failf!(ErrorKind::Table, "unknown type constructor {ctor}");
                };
                if base.arity as usize != args.len() {
                    return failf!(
                        ErrorKind::Table,
                        "{} applied to {} arguments",
                        self.qualified_name(*ctor),
                        args.len()
                    );
                }
                args.iter().try_for_each(|a| self.check_pseudo(owner, a))
            }
            PseudoTypeInfo::HigherOrder { args, .. } => {
                args.iter().try_for_each(|a| self.check_pseudo(owner, a))
            }
        }
    }

    pub fn define_du(
        &mut self,
        id: TypeCtorId,
        ctors: impl IntoIterator<Item = CtorDecl>,
    ) -> RttiResult<()> {
        let ctors: Vec<CtorDecl> = ctors.into_iter().collect();
        if self.table.try_ctor(id).is_some() && ctors.is_empty() {
            return failf!(ErrorKind::Table, "type {} has no constructors", self.qualified_name(id));
        }
        self.check_undefined(id)?;

        let mut seen: FxHashSet<(&str, usize)> = FxHashSet::default();
        for ctor in &ctors {
            if !seen.insert((ctor.name.as_str(), ctor.args.len())) {
                return failf!(
                    ErrorKind::Table,
                    "constructor {}/{} appears twice in {}",
                    ctor.name,
                    ctor.args.len(),
                    self.qualified_name(id)
                );
            }
            for arg in &ctor.args {
                self.check_pseudo(id, arg)?;
            }
        }

        let named: Vec<(Name, SV4<PseudoTypeInfo>)> =
            ctors.into_iter().map(|c| (self.table.names.intern(&c.name), c.args)).collect();
        let (layout, functors) = assign::assign_du(self.table.config.tag_bits, &named);
        self.undefined.remove(&id);
        let base = self.table.ctors.get_mut(id);
        base.layout = layout;
        base.functors = functors;
        Ok(())
    }

    pub fn define_equiv(&mut self, id: TypeCtorId, target: PseudoTypeInfo) -> RttiResult<()> {
        self.check_undefined(id)?;
        self.check_pseudo(id, &target)?;
        self.undefined.remove(&id);
        let bits = self.table.config.tag_bits;
        let base = self.table.ctors.get_mut(id);
        base.layout = TypeLayout { entries: bits.for_all_tags(LayoutEntry::Equiv), constants: None };
        base.functors = TypeFunctors::Equiv(target);
        Ok(())
    }

    pub fn set_special_preds(&mut self, id: TypeCtorId, special: SpecialPreds) -> RttiResult<()> {
        let Some(_) = self.table.try_ctor(id) else {
            return failf!(ErrorKind::Table, "unknown type constructor {id}");
        };
        self.table.ctors.get_mut(id).special = special;
        Ok(())
    }

    pub fn add_typeclass_base(
        &mut self,
        class_name: &str,
        instance_arity: u32,
        methods: impl IntoIterator<Item = ProcAddr>,
    ) -> BaseTypeclassId {
        let class_name = self.table.names.intern(class_name);
        let methods: SV8<ProcAddr> = methods.into_iter().collect();
        self.table.typeclass_bases.add(BaseTypeclassInfo { class_name, instance_arity, methods })
    }

    /// Expands every equivalence with `void` for its parameters. A chain
    /// that never reaches a real layout, or keeps growing, is cyclic.
    fn check_equiv_chains(&self) -> RttiResult<()> {
        let void = TypeInfo::base(self.table.builtins.void);
        for (id, base) in self.table.iter_ctors() {
            if !base.is_equiv() {
                continue;
            }
            let mut ti = TypeInfo::apply(id, std::iter::repeat_n(void.clone(), base.arity as usize));
            let mut steps = 0;
            while let Some(TypeFunctors::Equiv(target)) =
                ti.as_ctor().map(|ctor| &self.table.ctor(ctor).functors)
            {
                steps += 1;
                let Some(expanded) = target.instantiate(ti.args()) else {
                    return failf!(
                        ErrorKind::Table,
                        "equivalence in the expansion of {} mentions an unbound type variable",
                        self.qualified_name(id)
                    );
                };
                if steps > MAX_EQUIV_CHAIN || type_info_nodes(&expanded) > MAX_EQUIV_NODES {
                    return failf!(ErrorKind::Table, "type {} is cyclically equivalent to itself", self.qualified_name(id));
                }
                ti = expanded;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> RttiResult<TypeTable> {
        if let Some(id) = self.undefined.iter().min_by_key(|id| id.as_u32()) {
            return failf!(ErrorKind::Table, "type {} was declared but never defined", self.qualified_name(*id));
        }
        self.check_equiv_chains()?;
        info!(
            "type table ready: {} constructors, {} typeclass bases, {}",
            self.table.ctor_count(),
            self.table.typeclass_bases.len(),
            self.table.tag_bits()
        );
        Ok(self.table)
    }
}
