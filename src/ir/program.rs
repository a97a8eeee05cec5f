//! The program arena and its builder.
//!
//! A [`Program`] owns every class, field, method, and variable of the
//! system under analysis, plus the precomputed class hierarchy and
//! per-variable cross-indices. It is constructed once through
//! [`ProgramBuilder`], sealed by [`ProgramBuilder::finish`], and read
//! only from then on: analyses never mutate the program.

use indexmap::IndexSet;

use crate::ir::hierarchy::{ClassHierarchy, ClassInfo};
use crate::ir::method::{Body, MethodInfo, VarInfo, VarUsage};
use crate::ir::stmt::Stmt;
use crate::ir::types::{
    ClassFlags, ClassId, FieldId, MethodFlags, MethodId, StmtSite, SubsigId, Type, VarId,
};
use crate::{Error, Result};

/// A field of a class.
#[derive(Debug)]
pub struct FieldInfo {
    /// Field name.
    pub name: String,
    /// The declaring class.
    pub class: ClassId,
    /// Declared type.
    pub ty: Type,
}

/// The sealed program model.
#[derive(Debug)]
pub struct Program {
    classes: Vec<ClassInfo>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    vars: Vec<VarInfo>,
    usages: Vec<VarUsage>,
    subsigs: IndexSet<String>,
    hierarchy: ClassHierarchy,
    entry: Option<MethodId>,
}

impl Program {
    /// Returns the designated entry method, if one was set.
    #[must_use]
    pub fn entry_method(&self) -> Option<MethodId> {
        self.entry
    }

    /// Returns a class by id.
    #[must_use]
    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.index()]
    }

    /// Returns a field by id.
    #[must_use]
    pub fn field(&self, id: FieldId) -> &FieldInfo {
        &self.fields[id.index()]
    }

    /// Returns a method by id.
    #[must_use]
    pub fn method(&self, id: MethodId) -> &MethodInfo {
        &self.methods[id.index()]
    }

    /// Returns a variable by id.
    #[must_use]
    pub fn var(&self, id: VarId) -> &VarInfo {
        &self.vars[id.index()]
    }

    /// Returns the cross-indices of a variable.
    #[must_use]
    pub fn var_usage(&self, id: VarId) -> &VarUsage {
        &self.usages[id.index()]
    }

    /// Returns the interned text of a subsignature.
    #[must_use]
    pub fn subsig_str(&self, id: SubsigId) -> &str {
        self.subsigs
            .get_index(id.index())
            .map(String::as_str)
            .unwrap_or("<unknown>")
    }

    /// Looks up an interned subsignature by text.
    #[must_use]
    pub fn lookup_subsig(&self, text: &str) -> Option<SubsigId> {
        self.subsigs
            .get_index_of(text)
            .map(|index| SubsigId::new(index as u32))
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn lookup_class(&self, name: &str) -> Option<ClassId> {
        self.classes
            .iter()
            .position(|c| c.name == name)
            .map(|index| ClassId::new(index as u32))
    }

    /// Returns the number of methods.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods.len()
    }

    /// Returns the number of variables.
    #[must_use]
    pub fn var_count(&self) -> usize {
        self.vars.len()
    }

    /// Iterates over all method ids in declaration order.
    pub fn method_ids(&self) -> impl Iterator<Item = MethodId> {
        (0..self.methods.len() as u32).map(MethodId::new)
    }

    /// Returns the body of a method, absent for abstract methods.
    #[must_use]
    pub fn body(&self, method: MethodId) -> Option<&Body> {
        self.methods[method.index()].body.as_ref()
    }

    /// Returns the statement at a site.
    ///
    /// # Panics
    ///
    /// Panics if the site does not refer to a statement of a concrete
    /// method; sites are only produced from sealed bodies.
    #[must_use]
    pub fn stmt(&self, site: StmtSite) -> &Stmt {
        &self.body(site.method).expect("site of abstract method").stmts[site.index as usize]
    }

    /// Returns `true` if the variable's type is tracked by the integer
    /// constant lattice.
    #[must_use]
    pub fn can_hold_int(&self, var: VarId) -> bool {
        self.vars[var.index()].ty.can_hold_int()
    }

    /// Returns the precomputed class hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &ClassHierarchy {
        &self.hierarchy
    }

    /// Finds the method a call with the given subsignature dispatches
    /// to when the receiver's runtime class is `class`.
    ///
    /// Walks the superclass chain from `class` and returns the first
    /// declaration found, abstract or not; callers that only want
    /// callable targets filter abstract results.
    #[must_use]
    pub fn dispatch(&self, class: ClassId, subsig: SubsigId) -> Option<MethodId> {
        let mut current = Some(class);
        while let Some(id) = current {
            let info = self.class(id);
            if let Some(&method) = info.declared.get(&subsig) {
                return Some(method);
            }
            current = info.superclass;
        }
        None
    }
}

/// Incremental construction surface for [`Program`].
///
/// Ids are handed out densely in registration order, which is also the
/// deterministic iteration order of every downstream structure.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    classes: Vec<ClassInfo>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
    vars: Vec<VarInfo>,
    subsigs: IndexSet<String>,
    entry: Option<MethodId>,
}

impl ProgramBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a class or interface.
    pub fn add_class(
        &mut self,
        name: &str,
        superclass: Option<ClassId>,
        interfaces: &[ClassId],
        flags: ClassFlags,
    ) -> ClassId {
        let id = ClassId::new(self.classes.len() as u32);
        self.classes.push(ClassInfo {
            name: name.to_string(),
            superclass,
            interfaces: interfaces.to_vec(),
            flags,
            declared: indexmap::IndexMap::new(),
        });
        id
    }

    /// Registers a field on a class.
    pub fn add_field(&mut self, class: ClassId, name: &str, ty: Type) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        self.fields.push(FieldInfo {
            name: name.to_string(),
            class,
            ty,
        });
        id
    }

    /// Interns a subsignature and returns its id.
    pub fn subsig(&mut self, text: &str) -> SubsigId {
        let (index, _) = self.subsigs.insert_full(text.to_string());
        SubsigId::new(index as u32)
    }

    /// Registers a method on a class.
    ///
    /// The method starts without a body; give concrete methods one
    /// through [`ProgramBuilder::set_body`].
    pub fn add_method(
        &mut self,
        class: ClassId,
        name: &str,
        subsig: &str,
        flags: MethodFlags,
        return_type: Type,
    ) -> MethodId {
        let subsig = self.subsig(subsig);
        let id = MethodId::new(self.methods.len() as u32);
        self.methods.push(MethodInfo {
            name: name.to_string(),
            subsig,
            class,
            flags,
            return_type,
            body: None,
        });
        self.classes[class.index()].declared.insert(subsig, id);
        id
    }

    /// Registers a variable owned by a method.
    pub fn add_var(&mut self, method: MethodId, name: &str, ty: Type) -> VarId {
        let id = VarId::new(self.vars.len() as u32);
        self.vars.push(VarInfo {
            name: name.to_string(),
            ty,
            method,
        });
        id
    }

    /// Attaches a body to a method.
    pub fn set_body(&mut self, method: MethodId, body: Body) {
        self.methods[method.index()].body = Some(body);
    }

    /// Designates the program entry method.
    pub fn set_entry(&mut self, method: MethodId) {
        self.entry = Some(method);
    }

    /// Seals the program: validates the model, builds the class
    /// hierarchy, and computes per-variable cross-indices.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ir`] if a branch target is out of range, a
    /// statement references a variable of another method, or the
    /// designated entry method has no body.
    pub fn finish(self) -> Result<Program> {
        let Self {
            classes,
            fields,
            methods,
            vars,
            subsigs,
            entry,
        } = self;

        if let Some(entry) = entry {
            if methods[entry.index()].body.is_none() {
                return Err(Error::Ir(format!(
                    "entry method {} has no body",
                    methods[entry.index()].name
                )));
            }
        }

        let mut usages: Vec<VarUsage> = (0..vars.len()).map(|_| VarUsage::default()).collect();

        for (method_index, method) in methods.iter().enumerate() {
            let method_id = MethodId::new(method_index as u32);
            let Some(body) = &method.body else { continue };
            let len = body.stmts.len() as u32;
            for (index, stmt) in body.stmts.iter().enumerate() {
                let site = StmtSite::new(method_id, index as u32);

                for var in stmt.uses().into_iter().chain(stmt.def()) {
                    let owner = vars
                        .get(var.index())
                        .map(|info| info.method)
                        .ok_or_else(|| {
                            Error::Ir(format!("{site:?} references unknown variable"))
                        })?;
                    if owner != method_id {
                        return Err(Error::Ir(format!(
                            "{site:?} references a variable of another method"
                        )));
                    }
                }

                let check_target = |target: u32| {
                    if target < len {
                        Ok(())
                    } else {
                        Err(Error::Ir(format!(
                            "branch target {target} out of range in {}",
                            method.name
                        )))
                    }
                };

                match stmt {
                    Stmt::If { target, .. } | Stmt::Goto { target } => check_target(*target)?,
                    Stmt::Switch { cases, default, .. } => {
                        for (_, target) in cases {
                            check_target(*target)?;
                        }
                        check_target(*default)?;
                    }
                    Stmt::LoadField {
                        base: Some(base), ..
                    } => usages[base.index()].load_fields.push(site),
                    Stmt::StoreField {
                        base: Some(base), ..
                    } => usages[base.index()].store_fields.push(site),
                    Stmt::LoadArray { base, .. } => usages[base.index()].load_arrays.push(site),
                    Stmt::StoreArray { base, .. } => usages[base.index()].store_arrays.push(site),
                    Stmt::Invoke(invoke) => {
                        if let Some(receiver) = invoke.receiver {
                            usages[receiver.index()].invokes.push(site);
                        }
                        for &arg in &invoke.args {
                            let list = &mut usages[arg.index()].invokes_as_arg;
                            if list.last() != Some(&site) {
                                list.push(site);
                            }
                        }
                        if let Some(result) = invoke.result {
                            usages[result.index()].invokes_as_result.push(site);
                        }
                    }
                    _ => {}
                }
            }
        }

        let hierarchy = ClassHierarchy::build(&classes);

        Ok(Program {
            classes,
            fields,
            methods,
            vars,
            usages,
            subsigs,
            hierarchy,
            entry,
        })
    }
}
