// Copyright (c) 2025 knix
// All rights reserved.

//! Recovering the types and values of live variables at a stopped label.
//!
//! A debugger hands over a [`MachineSnapshot`] taken at the stop and the
//! [`LabelVars`] the compiler recorded for the label. The [`Inspector`] only
//! reads; nothing that goes wrong here is fatal, it just means a variable has
//! no value to show.

pub mod lval;


use ecow::EcoString;
use log::debug;

use crate::dispatch::Runtime;
use crate::heap::Word;
use crate::typeinfo::{PseudoTypeInfo, TypeInfo};
use crate::univ::Univ;

pub use lval::LiveLval;

/// Variables with these name prefixes are compiler plumbing and are hidden
/// from filtered lookups.
const HIDDEN_NAME_PREFIXES: [&str; 4] = ["TypeInfo", "TypeClassInfo", "ModuleInfo", "HLDS"];

/// Registers and stacks at the moment the program stopped. Stack pointers
/// are indices into the stack vectors; only valid for this one stop.
#[derive(Debug, Clone, Default)]
pub struct MachineSnapshot {
    /// `r1` is `regs[0]`
    pub regs: Vec<Word>,
    pub succip: Word,
    pub hp: Word,
    pub sp: usize,
    pub curfr: usize,
    pub maxfr: usize,
    pub det_stack: Vec<Word>,
    pub nondet_stack: Vec<Word>,
}

#[derive(Debug, Clone)]
pub struct LiveVar {
    pub name: Option<EcoString>,
    pub locn: LiveLval,
    pub pseudo_type: PseudoTypeInfo,
}

impl LiveVar {
    pub fn named(name: &str, locn: LiveLval, pseudo_type: PseudoTypeInfo) -> LiveVar {
        LiveVar { name: Some(EcoString::from(name)), locn, pseudo_type }
    }
}

/// What the compiler recorded about a label: its live variables, and where
/// the type info for each type variable `T1..Tn` is kept.
#[derive(Debug, Clone, Default)]
pub struct LabelVars {
    pub vars: Vec<LiveVar>,
    pub type_params: Vec<LiveLval>,
}

/// Concrete type infos for a label's type variables; `None` where one could
/// not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeParams(Vec<Option<TypeInfo>>);

impl TypeParams {
    pub fn new(params: Vec<Option<TypeInfo>>) -> TypeParams {
        TypeParams(params)
    }

    /// Type variable `n`, 1-based
    pub fn get(&self, n: u32) -> Option<&TypeInfo> {
        self.0.get((n as usize).checked_sub(1)?)?.as_ref()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Outcome of looking a variable up by name.
#[derive(Debug, Clone, PartialEq)]
pub enum VarLookup<T> {
    NotFound,
    /// Live, but a type variable in its type could not be resolved
    TypeUnavailable,
    /// Live and typed, but its location could not be read
    ValueUnavailable,
    Found(T),
}

impl<T> VarLookup<T> {
    pub fn found(&self) -> bool {
        !matches!(self, VarLookup::NotFound)
    }

    pub fn type_ok(&self) -> bool {
        matches!(self, VarLookup::ValueUnavailable | VarLookup::Found(_))
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            VarLookup::Found(t) => Some(t),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InspectedVar {
    pub name: EcoString,
    pub type_info: TypeInfo,
    pub value: Word,
}

impl InspectedVar {
    pub fn to_univ(&self, rt: &mut Runtime) -> Univ {
        Univ::new(rt, &self.type_info, self.value)
    }
}

pub fn is_hidden_name(name: &str) -> bool {
    HIDDEN_NAME_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

pub struct Inspector<'a> {
    rt: &'a Runtime,
    snapshot: &'a MachineSnapshot,
    saved_regs_valid: bool,
    base_sp: usize,
    base_curfr: usize,
}

impl<'a> Inspector<'a> {
    /// Inspects the frame the program stopped in.
    pub fn new(rt: &'a Runtime, snapshot: &'a MachineSnapshot) -> Inspector<'a> {
        Inspector { rt, snapshot, saved_regs_valid: true, base_sp: snapshot.sp, base_curfr: snapshot.curfr }
    }

    /// Inspects an ancestor frame. Registers belong to the stopped frame, so
    /// register-resident values are unavailable here.
    pub fn at_ancestor(
        rt: &'a Runtime,
        snapshot: &'a MachineSnapshot,
        base_sp: usize,
        base_curfr: usize,
    ) -> Inspector<'a> {
        Inspector { rt, snapshot, saved_regs_valid: false, base_sp, base_curfr }
    }

    pub fn saved_regs_valid(&self) -> bool {
        self.saved_regs_valid
    }

    pub fn lookup_live_lval(&self, locn: LiveLval) -> Option<Word> {
        if locn.needs_saved_regs() && !self.saved_regs_valid {
            debug!("{locn} is not available without saved registers");
            return None;
        }
        let snapshot = self.snapshot;
        let word = match locn {
            LiveLval::Register(n) => {
                let index = (n as usize).checked_sub(1)?;
                snapshot.regs.get(index).copied()
            }
            LiveLval::StackVar(n) => {
                let index = self.base_sp.checked_sub(n as usize)?;
                snapshot.det_stack.get(index).copied()
            }
            LiveLval::FrameVar(n) => {
                let index = self.base_curfr.checked_sub(n as usize + lval::NONDET_FIXED_SIZE - 1)?;
                snapshot.nondet_stack.get(index).copied()
            }
            LiveLval::Succip => Some(snapshot.succip),
            LiveLval::Maxfr => Some(snapshot.maxfr as Word),
            LiveLval::Curfr => Some(self.base_curfr as Word),
            LiveLval::Hp => Some(snapshot.hp),
            LiveLval::Sp => Some(self.base_sp as Word),
            LiveLval::Unknown => None,
        };
        if word.is_none() {
            debug!("{locn} is outside the snapshot");
        }
        word
    }

    /// Reads the type info of every type variable of the label.
    pub fn materialize_type_params(&self, label: &LabelVars) -> TypeParams {
        let params = label
            .type_params
            .iter()
            .enumerate()
            .map(|(i, locn)| {
                let word = self.lookup_live_lval(*locn)?;
                let ti = TypeInfo::from_word(&self.rt.table, &self.rt.heap, word);
                if ti.is_none() {
                    debug!("T{} at {locn} holds {word:#x}, which is not a type info", i + 1);
                }
                ti
            })
            .collect();
        TypeParams(params)
    }

    pub fn get_type(&self, var: &LiveVar, params: &TypeParams) -> Option<TypeInfo> {
        var.pseudo_type.instantiate_with(&|n| params.get(n).cloned())
    }

    pub fn get_type_and_value(&self, var: &LiveVar, params: &TypeParams) -> Option<(TypeInfo, Word)> {
        let ti = self.get_type(var, params)?;
        let value = self.lookup_live_lval(var.locn)?;
        Some((ti, value))
    }

    fn find_var<'l>(&self, label: &'l LabelVars, name: &str) -> Option<&'l LiveVar> {
        if is_hidden_name(name) {
            return None;
        }
        label.vars.iter().find(|v| v.name.as_deref() == Some(name))
    }

    pub fn get_type_filtered(&self, label: &LabelVars, name: &str) -> VarLookup<TypeInfo> {
        let Some(var) = self.find_var(label, name) else {
            return VarLookup::NotFound;
        };
        let params = self.materialize_type_params(label);
        match self.get_type(var, &params) {
            Some(ti) => VarLookup::Found(ti),
            None => VarLookup::TypeUnavailable,
        }
    }

    pub fn get_type_and_value_filtered(&self, label: &LabelVars, name: &str) -> VarLookup<(TypeInfo, Word)> {
        let Some(var) = self.find_var(label, name) else {
            return VarLookup::NotFound;
        };
        let params = self.materialize_type_params(label);
        let Some(ti) = self.get_type(var, &params) else {
            return VarLookup::TypeUnavailable;
        };
        match self.lookup_live_lval(var.locn) {
            Some(value) => VarLookup::Found((ti, value)),
            None => VarLookup::ValueUnavailable,
        }
    }

    /// Every named, visible variable whose type and value can both be
    /// recovered, in label order.
    pub fn make_var_list(&self, label: &LabelVars) -> Vec<InspectedVar> {
        let params = self.materialize_type_params(label);
        label
            .vars
            .iter()
            .filter_map(|var| {
                let name = var.name.as_ref()?;
                if is_hidden_name(name) {
                    return None;
                }
                let (type_info, value) = self.get_type_and_value(var, &params)?;
                Some(InspectedVar { name: name.clone(), type_info, value })
            })
            .collect()
    }
}
