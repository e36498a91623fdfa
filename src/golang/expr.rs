use crate::exec::kind::Kind;
use crate::lang::value::Value;

/// Precedence of operands that never need parentheses.
pub(crate) const PRIMARY: u8 = 7;

/// Precedence of unary operator expressions.
pub(crate) const UNARY: u8 = 6;

/// Piece of generated text. Slots are reserved constants filled in later.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Segment {
    Text(String),
    Slot(usize),
}

/// Source fragment of one expression on the builder's stack.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Expr {
    pub segs: Vec<Segment>,
    pub prec: u8,
    /// A call expression may stand alone as a statement.
    pub is_call: bool,
}

impl Expr {
    pub fn new(prec: u8) -> Self {
        Self {
            segs: Vec::new(),
            prec,
            is_call: false,
        }
    }

    pub fn text(s: impl Into<String>, prec: u8) -> Self {
        let mut e = Self::new(prec);
        e.push_str(s);
        e
    }

    pub fn primary(s: impl Into<String>) -> Self {
        Self::text(s, PRIMARY)
    }

    pub fn slot(i: usize) -> Self {
        Self {
            segs: vec![Segment::Slot(i)],
            prec: PRIMARY,
            is_call: false,
        }
    }

    pub fn push_str(&mut self, s: impl Into<String>) -> &mut Self {
        let s = s.into();
        if s.is_empty() {
            return self;
        }
        match self.segs.last_mut() {
            Some(Segment::Text(last)) => last.push_str(&s),
            _ => self.segs.push(Segment::Text(s)),
        }
        self
    }

    pub fn push_expr(&mut self, e: Expr) -> &mut Self {
        for seg in e.segs {
            match seg {
                Segment::Text(s) => {
                    self.push_str(s);
                }
                slot => self.segs.push(slot),
            }
        }
        self
    }

    /// Append `e`, parenthesized when it binds looser than `min_prec`.
    pub fn push_operand(&mut self, e: Expr, min_prec: u8) -> &mut Self {
        if e.prec < min_prec {
            self.push_str("(");
            self.push_expr(e);
            self.push_str(")")
        } else {
            self.push_expr(e)
        }
    }

    /// `head(arg, arg, ...)`.
    pub fn call(head: Expr, args: Vec<Expr>, ellipsis: bool) -> Expr {
        let mut e = Expr::new(PRIMARY);
        e.push_operand(head, PRIMARY);
        e.push_str("(");
        e.push_list(args);
        if ellipsis {
            e.push_str("...");
        }
        e.push_str(")");
        e.is_call = true;
        e
    }

    pub fn push_list(&mut self, items: Vec<Expr>) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.push_str(", ");
            }
            self.push_expr(item);
        }
        self
    }

    /// Safe to evaluate more than once.
    pub fn is_simple(&self) -> bool {
        self.prec == PRIMARY && !self.is_call
    }
}

/// Go literal for a constant of its own kind; kinds other than the default
/// ones get an explicit conversion.
pub(crate) fn go_literal(v: &Value) -> String {
    match v {
        Value::Bool(_) | Value::Int(_) | Value::Float64(_) | Value::Complex128(_) | Value::String(_) => {
            v.literal()
        }
        other => format!("{}({})", other.kind().name(), other.literal()),
    }
}

/// Literal of the zero value of a basic kind.
pub(crate) fn zero_literal(kind: Kind) -> Option<String> {
    let zero = match kind {
        Kind::Bool => Value::Bool(false),
        Kind::String => Value::String(String::new()),
        k if k.is_integer() => Value::from_i128(k, 0)?,
        k if k.is_float() => Value::from_f64(k, 0.0)?,
        k if k.is_complex() => Value::from_complex(k, num_complex::Complex64::new(0.0, 0.0))?,
        _ => return None,
    };
    Some(go_literal(&zero))
}

pub(crate) fn render(segs: &[Segment], slots: &[Option<String>], out: &mut String) {
    for seg in segs {
        match seg {
            Segment::Text(s) => out.push_str(s),
            Segment::Slot(i) => match slots.get(*i) {
                Some(Some(s)) => out.push_str(s),
                _ => crate::cl::internal_error(format!("reserved slot {} rendered before it was filled", i)),
            },
        }
    }
}
