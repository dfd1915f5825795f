//! Syntax tree for marker expressions.

// ============================================================================
// AST Definitions
// ============================================================================

/// A compiled body: either a lone expression whose value is returned, or a
/// statement block.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Body {
	Expression(Expr),
	Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Stmt {
	Expression(Expr),
	Return(Option<Expr>),
	If {
		test: Expr,
		consequent: Box<Stmt>,
		alternate: Option<Box<Stmt>>,
	},
	Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Literal {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	String(String),
}

/// Injected locals. Only these two exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Local {
	El,
	Event,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnaryOp {
	Not,
	Neg,
	Plus,
	Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BinaryOp {
	Add,
	Sub,
	Mul,
	Div,
	Rem,
	Lt,
	Le,
	Gt,
	Ge,
	StrictEq,
	StrictNe,
	LooseEq,
	LooseNe,
	And,
	Or,
	Coalesce,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AssignOp {
	Assign,
	Add,
	Sub,
}

/// Places an assignment may write to.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Target {
	/// `name` or `this.name`
	Field(String),
	/// `$el.name` or `$el["name"]`
	ElementProperty(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Expr {
	Literal(Literal),
	/// A component field; bare `name` and `this.name` are the same thing.
	Field(String),
	Local(Local),
	Member {
		object: Box<Expr>,
		property: String,
	},
	Index {
		object: Box<Expr>,
		index: Box<Expr>,
	},
	Call {
		callee: Box<Expr>,
		args: Vec<Expr>,
	},
	Unary {
		op: UnaryOp,
		operand: Box<Expr>,
	},
	Binary {
		op: BinaryOp,
		left: Box<Expr>,
		right: Box<Expr>,
	},
	Conditional {
		test: Box<Expr>,
		consequent: Box<Expr>,
		alternate: Box<Expr>,
	},
	Assign {
		op: AssignOp,
		target: Target,
		value: Box<Expr>,
	},
}

impl Expr {
	pub(crate) fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
		Expr::Binary {
			op,
			left: Box::new(left),
			right: Box::new(right),
		}
	}

	/// Converts an already parsed left-hand side into an assignment target.
	pub(crate) fn into_target(self) -> Option<Target> {
		match self {
			Expr::Field(name) => Some(Target::Field(name)),
			Expr::Member { object, property } if *object == Expr::Local(Local::El) => {
				Some(Target::ElementProperty(property))
			}
			Expr::Index { object, index } if *object == Expr::Local(Local::El) => match *index {
				Expr::Literal(Literal::String(property)) => Some(Target::ElementProperty(property)),
				_ => None,
			},
			_ => None,
		}
	}
}
