//! Abstract Syntax Tree definitions for the inferred JavaScript subset.
//!
//! Trees are produced by an external parser (or by [`super::AstBuilder`]).
//! Every expression, statement and function carries a [`NodeId`] that the
//! inference results are keyed by.

use std::fmt;

/// Byte range in the original source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Identity of an AST node, unique within one [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A program is a sequence of top-level statements.
#[derive(Debug, Clone)]
pub struct Program {
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Undefined,
    Boolean(bool),
    Number(f64),
    String(String),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Lt,
    Gt,
    LtEq,
    GtEq,
    EqEq,
    NotEq,
    EqEqEq,
    NotEqEq,

    // Logical
    And,
    Or,

    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LShift,
    RShift,
    URShift,

    // Membership
    In,
    Instanceof,
}

impl BinOp {
    /// Operators whose result is always a number.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            BinOp::Sub
                | BinOp::Mul
                | BinOp::Div
                | BinOp::Mod
                | BinOp::Pow
                | BinOp::BitAnd
                | BinOp::BitOr
                | BinOp::BitXor
                | BinOp::LShift
                | BinOp::RShift
                | BinOp::URShift
        )
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,    // -
    Pos,    // +
    Not,    // !
    BitNot, // ~
    Typeof, // typeof
    Void,   // void
    Delete, // delete

    PreInc,  // ++x
    PreDec,  // --x
    PostInc, // x++
    PostDec, // x--
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,        // =
    AddAssign,     // +=
    SubAssign,     // -=
    MulAssign,     // *=
    DivAssign,     // /=
    ModAssign,     // %=
    PowAssign,     // **=
    LShiftAssign,  // <<=
    RShiftAssign,  // >>=
    URShiftAssign, // >>>=
    BitAndAssign,  // &=
    BitOrAssign,   // |=
    BitXorAssign,  // ^=
}

impl AssignOp {
    /// The binary operator a compound assignment applies, `None` for plain `=`.
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::AddAssign => Some(BinOp::Add),
            AssignOp::SubAssign => Some(BinOp::Sub),
            AssignOp::MulAssign => Some(BinOp::Mul),
            AssignOp::DivAssign => Some(BinOp::Div),
            AssignOp::ModAssign => Some(BinOp::Mod),
            AssignOp::PowAssign => Some(BinOp::Pow),
            AssignOp::LShiftAssign => Some(BinOp::LShift),
            AssignOp::RShiftAssign => Some(BinOp::RShift),
            AssignOp::URShiftAssign => Some(BinOp::URShift),
            AssignOp::BitAndAssign => Some(BinOp::BitAnd),
            AssignOp::BitOrAssign => Some(BinOp::BitOr),
            AssignOp::BitXorAssign => Some(BinOp::BitXor),
        }
    }
}

/// Object literal property: `key: value`
#[derive(Debug, Clone)]
pub struct Property {
    pub key: String,
    pub value: Expr,
    pub span: Span,
}

/// A function literal, shared by declarations and expressions.
#[derive(Debug, Clone)]
pub struct Function {
    pub id: NodeId,
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Expression AST node
#[derive(Debug, Clone)]
pub struct Expr {
    pub id: NodeId,
    pub span: Span,
    pub kind: ExprKind,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Literal value
    Lit(Literal),

    /// Variable reference
    Ident(String),

    /// `this` keyword
    This,

    /// Array literal: [a, b, c]
    Array(Vec<Expr>),

    /// Object literal: {a: 1, b: 2}
    Object(Vec<Property>),

    /// Function expression: function(a, b) { ... }
    Function(Box<Function>),

    /// Property access: obj.prop
    Member { object: Box<Expr>, property: String },

    /// Computed property access: obj[expr]
    ComputedMember {
        object: Box<Expr>,
        property: Box<Expr>,
    },

    /// Function call: func(a, b). A missing callee is a malformed tree.
    Call {
        callee: Option<Box<Expr>>,
        arguments: Vec<Expr>,
    },

    /// New expression: new Ctor(a, b)
    New {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },

    /// Unary operation: -x, !x, typeof x
    Unary { op: UnaryOp, argument: Box<Expr> },

    /// Binary operation: a + b
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Assignment: a = b, a += b
    Assign {
        op: AssignOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Conditional: a ? b : c
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },

    /// Sequence: a, b, c
    Sequence(Vec<Expr>),
}

impl Expr {
    /// Check if this expression is a valid assignment target
    pub fn is_valid_assignment_target(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::Ident(_) | ExprKind::Member { .. } | ExprKind::ComputedMember { .. }
        )
    }

    /// The identifier name, if this is a bare identifier.
    pub fn as_ident(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name),
            _ => None,
        }
    }
}

/// Variable declarator: name = init
#[derive(Debug, Clone)]
pub struct VarDeclarator {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Span,
}

/// For loop initializer
#[derive(Debug, Clone)]
pub enum ForInit {
    VarDecl(Vec<VarDeclarator>),
    Expr(Expr),
}

/// Left-hand side of for-in
#[derive(Debug, Clone)]
pub enum ForInLhs {
    /// var x
    VarDecl(String),
    /// x (existing variable)
    Expr(Expr),
}

/// Catch clause
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: String,
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// Switch case
#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// None for default case
    pub test: Option<Expr>,
    pub consequent: Vec<Stmt>,
    pub span: Span,
}

/// Statement AST node
#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<Stmt>),

    Empty,

    Expr(Expr),

    /// var a = 1, b = 2;
    Var(Vec<VarDeclarator>),

    /// function name(params) { }
    FunctionDecl(Box<Function>),

    Return(Option<Expr>),

    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },

    While {
        test: Expr,
        body: Box<Stmt>,
    },

    DoWhile {
        body: Box<Stmt>,
        test: Expr,
    },

    For {
        init: Option<ForInit>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },

    ForIn {
        left: ForInLhs,
        right: Expr,
        body: Box<Stmt>,
    },

    Switch {
        discriminant: Expr,
        cases: Vec<SwitchCase>,
    },

    Break,

    Continue,

    Throw(Expr),

    Try {
        block: Vec<Stmt>,
        handler: Option<CatchClause>,
        finalizer: Option<Vec<Stmt>>,
    },
}

impl Stmt {
    /// Whether control can never fall off the end of this statement.
    ///
    /// Used to decide if a function body may complete with an implicit
    /// `undefined` return.
    pub fn always_exits(&self) -> bool {
        match &self.kind {
            StmtKind::Return(_) | StmtKind::Throw(_) => true,
            StmtKind::Block(body) => body.iter().any(Stmt::always_exits),
            StmtKind::If {
                consequent,
                alternate: Some(alternate),
                ..
            } => consequent.always_exits() && alternate.always_exits(),
            StmtKind::Try {
                block,
                handler,
                finalizer,
            } => {
                let finally_exits = finalizer
                    .as_ref()
                    .map_or(false, |f| f.iter().any(Stmt::always_exits));
                let block_exits = block.iter().any(Stmt::always_exits);
                let handler_exits = handler
                    .as_ref()
                    .map_or(true, |h| h.body.iter().any(Stmt::always_exits));
                finally_exits || (block_exits && handler_exits)
            }
            _ => false,
        }
    }
}
