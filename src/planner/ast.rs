//! The input expression tree handed to the planner (spec §4.1, §6).
//!
//! This is deliberately a thin, already-checked tree: no lexing, parsing or
//! type-checking happens in this crate (spec §1 "Out of scope"). A host
//! front end builds `Expr` directly (or translates its own AST into it)
//! after parsing and type-checking have already run.

use crate::value::Value;

/// One node of the input tree. Each node carries the expression id its
/// planned counterpart will be recorded under in `EvalState`.
#[derive(Clone, Debug)]
pub enum Expr {
    /// A literal.
    Const { id: i64, value: Value },
    /// A bare identifier, lowered to an `Absolute` or `Maybe` attribute
    /// depending on whether the host already fully qualified it.
    Ident { id: i64, name: String, qualified: bool },
    /// `operand.field`, or `has(operand.field)` when `test_only` is set
    /// (spec §4.2 `FieldExistsTest`).
    Select { id: i64, operand: Box<Expr>, field: String, test_only: bool },
    /// `operand[index]`: a dynamic qualifier, since `index` is itself an
    /// expression rather than a literal field name.
    Index { id: i64, operand: Box<Expr>, index: Box<Expr> },
    /// A function or method call already bound to a concrete overload id
    /// by the host's type checker (spec §4.1 "the planner does not
    /// perform overload resolution"). `target` is `Some` for a
    /// receiver-style call (`a.f(b)`).
    Call {
        id: i64,
        function: String,
        overload_id: String,
        target: Option<Box<Expr>>,
        args: Vec<Expr>,
    },
    CreateList { id: i64, elements: Vec<Expr> },
    CreateMap { id: i64, entries: Vec<(Expr, Expr)> },
    CreateObject { id: i64, type_name: String, fields: Vec<(String, Expr)> },
    /// The generic CEL comprehension (`fold`): `accuVar` starts at
    /// `accu_init` and is updated by `loop_step` for each `iterVar` drawn
    /// from `iter_range`, stopping early once `loop_condition` is false;
    /// `result` is evaluated once folding stops (spec §4.2).
    Comprehension {
        id: i64,
        iter_range: Box<Expr>,
        iter_var: String,
        accu_var: String,
        accu_init: Box<Expr>,
        loop_condition: Box<Expr>,
        loop_step: Box<Expr>,
        result: Box<Expr>,
    },
}

/// Well-known overload ids the planner specializes into dedicated node
/// kinds rather than generic calls (spec §4.1 "core lowering"). These
/// match the conventional CEL operator overload ids so a host type checker
/// needs no special knowledge of this crate to produce them.
pub mod overload_id {
    pub const LOGICAL_AND: &str = "logical_and";
    pub const LOGICAL_OR: &str = "logical_or";
    pub const CONDITIONAL: &str = "conditional";
    pub const EQUALS: &str = "equals";
    pub const NOT_EQUALS: &str = "not_equals";
    pub const IN_LIST: &str = "in_list";
    pub const IN_MAP: &str = "in_map";
}

impl Expr {
    pub fn id(&self) -> i64 {
        match self {
            Expr::Const { id, .. }
            | Expr::Ident { id, .. }
            | Expr::Select { id, .. }
            | Expr::Index { id, .. }
            | Expr::Call { id, .. }
            | Expr::CreateList { id, .. }
            | Expr::CreateMap { id, .. }
            | Expr::CreateObject { id, .. }
            | Expr::Comprehension { id, .. } => *id,
        }
    }
}
