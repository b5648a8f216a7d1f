//! Expression language of `Expr` nodes.
//!
//! The source text is tokenized and parsed into a tree whose leaves are literals, `pi`
//! and the named slots `a`, `b`, `time` (alias `u_time`) and `uv`. Lowering resolves the
//! slots by lookup in an [`ExprEnv`], so a slot name can never leak into or be rewritten
//! inside other tokens.
//!
//! Grammar:
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | postfix
//! postfix := primary ('.' swizzle)*
//! primary := number | ident | ident '(' args ')' | '(' expr ')'
//! ```

use anyhow::{Result, anyhow, bail};

use super::types::{TypedExpr, ValueType};
use super::utils::{coerce_to_type, fmt_f32, literal_value, member};

const MAX_DEPTH: usize = 64;

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Num(f32),
    Ident(String),
    Sym(char),
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Num(v) => format!("number {v}"),
            Token::Ident(s) => format!("`{s}`"),
            Token::Sym(c) => format!("`{c}`"),
        }
    }
}

fn tokenize(src: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let starts_number =
            c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(|d| d.is_ascii_digit()));
        if starts_number {
            let start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i < chars.len() && chars[i] == '.' {
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
            }
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            let text: String = chars[start..i].iter().collect();
            let v = text
                .parse::<f32>()
                .map_err(|e| anyhow!("bad number `{text}`: {e}"))?;
            tokens.push(Token::Num(v));
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        match c {
            '+' | '-' | '*' | '/' | '%' | '(' | ')' | ',' | '.' => {
                tokens.push(Token::Sym(c));
                i += 1;
            }
            other => bail!("unexpected character `{other}`"),
        }
    }
    Ok(tokens)
}

/// Free variables an expression may reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
    Time,
    Uv,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinOp {
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
        }
    }

    fn apply(self, l: f32, r: f32) -> f32 {
        match self {
            BinOp::Add => l + r,
            BinOp::Sub => l - r,
            BinOp::Mul => l * r,
            BinOp::Div => l / r,
            // WGSL's float `%` truncates like Rust's.
            BinOp::Rem => l % r,
        }
    }
}

/// A WGSL builtin callable from expressions.
#[derive(Debug)]
pub struct Builtin {
    pub name: &'static str,
    pub arity: usize,
    /// Result is always `f32` (`length`, `distance`, `dot`); otherwise it has the type of
    /// the (splatted) arguments.
    pub scalar_result: bool,
    /// Scalar semantics, used to fold calls whose arguments are all literals.
    pub eval: fn(&[f32]) -> f32,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Builtin {}

const fn builtin(name: &'static str, arity: usize, scalar_result: bool, eval: fn(&[f32]) -> f32) -> Builtin {
    Builtin {
        name,
        arity,
        scalar_result,
        eval,
    }
}

fn wgsl_sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn wgsl_clamp(x: f32, lo: f32, hi: f32) -> f32 {
    x.max(lo).min(hi)
}

fn wgsl_smoothstep(lo: f32, hi: f32, x: f32) -> f32 {
    let t = wgsl_clamp((x - lo) / (hi - lo), 0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

const BUILTINS: &[Builtin] = &[
    builtin("sin", 1, false, |x| x[0].sin()),
    builtin("cos", 1, false, |x| x[0].cos()),
    builtin("tan", 1, false, |x| x[0].tan()),
    builtin("asin", 1, false, |x| x[0].asin()),
    builtin("acos", 1, false, |x| x[0].acos()),
    builtin("atan", 1, false, |x| x[0].atan()),
    builtin("sinh", 1, false, |x| x[0].sinh()),
    builtin("cosh", 1, false, |x| x[0].cosh()),
    builtin("tanh", 1, false, |x| x[0].tanh()),
    builtin("abs", 1, false, |x| x[0].abs()),
    builtin("floor", 1, false, |x| x[0].floor()),
    builtin("ceil", 1, false, |x| x[0].ceil()),
    builtin("round", 1, false, |x| x[0].round_ties_even()),
    builtin("trunc", 1, false, |x| x[0].trunc()),
    builtin("fract", 1, false, |x| x[0] - x[0].floor()),
    builtin("saturate", 1, false, |x| wgsl_clamp(x[0], 0.0, 1.0)),
    builtin("sqrt", 1, false, |x| x[0].sqrt()),
    builtin("inverseSqrt", 1, false, |x| 1.0 / x[0].sqrt()),
    builtin("exp", 1, false, |x| x[0].exp()),
    builtin("exp2", 1, false, |x| x[0].exp2()),
    builtin("log", 1, false, |x| x[0].ln()),
    builtin("log2", 1, false, |x| x[0].log2()),
    builtin("sign", 1, false, |x| wgsl_sign(x[0])),
    builtin("degrees", 1, false, |x| x[0].to_degrees()),
    builtin("radians", 1, false, |x| x[0].to_radians()),
    builtin("length", 1, true, |x| x[0].abs()),
    builtin("min", 2, false, |x| x[0].min(x[1])),
    builtin("max", 2, false, |x| x[0].max(x[1])),
    builtin("pow", 2, false, |x| x[0].powf(x[1])),
    builtin("step", 2, false, |x| if x[1] >= x[0] { 1.0 } else { 0.0 }),
    builtin("atan2", 2, false, |x| x[0].atan2(x[1])),
    builtin("distance", 2, true, |x| (x[0] - x[1]).abs()),
    builtin("dot", 2, true, |x| x[0] * x[1]),
    builtin("mix", 3, false, |x| x[0] * (1.0 - x[2]) + x[1] * x[2]),
    builtin("clamp", 3, false, |x| wgsl_clamp(x[0], x[1], x[2])),
    builtin("smoothstep", 3, false, |x| wgsl_smoothstep(x[0], x[1], x[2])),
];

fn find_builtin(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Num(f32),
    Pi,
    Slot(Slot),
    Neg(Box<Expr>),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(&'static Builtin, Vec<Expr>),
    Swizzle(Box<Expr>, String),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn eat(&mut self, sym: char) -> bool {
        if self.peek() == Some(&Token::Sym(sym)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, sym: char) -> Result<()> {
        match self.next() {
            Some(Token::Sym(c)) if c == sym => Ok(()),
            Some(t) => bail!("expected `{sym}`, found {}", t.describe()),
            None => bail!("expected `{sym}`, found end of expression"),
        }
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            bail!("expression nested too deeply");
        }
        Ok(())
    }

    fn expr(&mut self) -> Result<Expr> {
        self.enter()?;
        let mut lhs = self.term()?;
        loop {
            let op = if self.eat('+') {
                BinOp::Add
            } else if self.eat('-') {
                BinOp::Sub
            } else {
                break;
            };
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        self.depth -= 1;
        Ok(lhs)
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = if self.eat('*') {
                BinOp::Mul
            } else if self.eat('/') {
                BinOp::Div
            } else if self.eat('%') {
                BinOp::Rem
            } else {
                break;
            };
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.eat('-') {
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        if self.eat('+') {
            self.enter()?;
            let inner = self.unary()?;
            self.depth -= 1;
            return Ok(inner);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut e = self.primary()?;
        while self.eat('.') {
            match self.next() {
                Some(Token::Ident(s))
                    if (1..=2).contains(&s.len()) && s.chars().all(|c| c == 'x' || c == 'y') =>
                {
                    e = Expr::Swizzle(Box::new(e), s);
                }
                Some(t) => bail!("invalid swizzle {}", t.describe()),
                None => bail!("expected swizzle after `.`"),
            }
        }
        Ok(e)
    }

    fn primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Num(v)) => Ok(Expr::Num(v)),
            Some(Token::Ident(name)) => {
                if self.eat('(') {
                    let f = find_builtin(&name).ok_or_else(|| anyhow!("unknown function `{name}`"))?;
                    let args = self.args()?;
                    if args.len() != f.arity {
                        bail!("`{name}` takes {} argument(s), got {}", f.arity, args.len());
                    }
                    return Ok(Expr::Call(f, args));
                }
                match name.as_str() {
                    "a" => Ok(Expr::Slot(Slot::A)),
                    "b" => Ok(Expr::Slot(Slot::B)),
                    "time" | "u_time" => Ok(Expr::Slot(Slot::Time)),
                    "uv" => Ok(Expr::Slot(Slot::Uv)),
                    "pi" | "PI" => Ok(Expr::Pi),
                    _ => bail!("unknown identifier `{name}`"),
                }
            }
            Some(Token::Sym('(')) => {
                let e = self.expr()?;
                self.expect(')')?;
                Ok(e)
            }
            Some(t) => bail!("unexpected {}", t.describe()),
            None => bail!("unexpected end of expression"),
        }
    }

    fn args(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.eat(')') {
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            if self.eat(',') {
                continue;
            }
            self.expect(')')?;
            return Ok(args);
        }
    }
}

pub fn parse(src: &str) -> Result<Expr> {
    let tokens = tokenize(src)?;
    if tokens.is_empty() {
        bail!("empty expression");
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let e = parser.expr()?;
    if let Some(t) = parser.peek() {
        bail!("unexpected {} after expression", t.describe());
    }
    Ok(e)
}

/// What each slot lowers to.
#[derive(Clone, Debug)]
pub struct ExprEnv {
    pub a: TypedExpr,
    pub b: TypedExpr,
    pub time: TypedExpr,
    pub uv: TypedExpr,
}

fn widest(args: &[TypedExpr]) -> ValueType {
    args.iter()
        .map(|a| a.ty)
        .max_by_key(|ty| ty.components())
        .unwrap_or(ValueType::F32)
}

fn folded(v: f32) -> TypedExpr {
    TypedExpr::new(fmt_f32(v), ValueType::F32)
}

/// `clamp` and `smoothstep` with literal bounds out of order, which WGSL rejects as constant
/// arguments. Rewritten to what the runtime formulas compute.
fn lower_inverted_bounds(f: &Builtin, args: &[TypedExpr]) -> Option<TypedExpr> {
    let (lo, hi) = match f.name {
        "clamp" => (literal_value(&args[1])?, literal_value(&args[2])?),
        "smoothstep" => (literal_value(&args[0])?, literal_value(&args[1])?),
        _ => return None,
    };
    let x = &args[if f.name == "clamp" { 0 } else { 2 }];
    match f.name {
        // min(max(x, lo), hi) is always `hi` here.
        "clamp" if lo > hi => Some(coerce_to_type(&folded(hi), x.ty)),
        "smoothstep" if lo == hi => {
            let edge = coerce_to_type(&folded(lo), x.ty);
            Some(TypedExpr::new(format!("step({}, {})", edge.expr, x.expr), x.ty))
        }
        "smoothstep" if lo > hi => {
            let lo = coerce_to_type(&folded(lo), x.ty);
            let hi = coerce_to_type(&folded(hi), x.ty);
            let one = coerce_to_type(&folded(1.0), x.ty);
            Some(TypedExpr::new(
                format!("({} - smoothstep({}, {}, {}))", one.expr, hi.expr, lo.expr, x.expr),
                x.ty,
            ))
        }
        _ => None,
    }
}

/// Lower a parsed expression to WGSL.
///
/// Operations whose operands are all literals (including unwired slots, which read as
/// `0.0`) are evaluated here. A constant WGSL expression that divides by zero or
/// overflows is a shader-creation error, while a folded non-finite result becomes `0.0`.
pub fn lower(expr: &Expr, env: &ExprEnv) -> Result<TypedExpr> {
    Ok(match expr {
        Expr::Num(v) => folded(*v),
        Expr::Pi => folded(std::f32::consts::PI),
        Expr::Slot(Slot::A) => env.a.clone(),
        Expr::Slot(Slot::B) => env.b.clone(),
        Expr::Slot(Slot::Time) => env.time.clone(),
        Expr::Slot(Slot::Uv) => env.uv.clone(),
        Expr::Neg(inner) => {
            let x = lower(inner, env)?;
            match literal_value(&x) {
                Some(v) => folded(-v),
                None => TypedExpr::new(format!("(-{})", x.expr), x.ty),
            }
        }
        Expr::Binary(op, lhs, rhs) => {
            let l = lower(lhs, env)?;
            let r = lower(rhs, env)?;
            match (literal_value(&l), literal_value(&r)) {
                (Some(lv), Some(rv)) => folded(op.apply(lv, rv)),
                _ => {
                    let ty = widest(&[l.clone(), r.clone()]);
                    TypedExpr::new(format!("({} {} {})", l.expr, op.symbol(), r.expr), ty)
                }
            }
        }
        Expr::Call(f, args) => {
            let args = args
                .iter()
                .map(|a| lower(a, env))
                .collect::<Result<Vec<_>>>()?;
            let literals: Option<Vec<f32>> = args.iter().map(literal_value).collect();
            if let Some(values) = literals {
                return Ok(folded((f.eval)(&values)));
            }

            if let Some(out) = lower_inverted_bounds(f, &args) {
                return Ok(out);
            }

            let ty = widest(&args);
            let args: Vec<String> = args
                .iter()
                .map(|a| coerce_to_type(a, ty).expr)
                .collect();
            match (f.name, ty) {
                // WGSL's dot is vector-only.
                ("dot", ValueType::F32) => {
                    TypedExpr::new(format!("({} * {})", args[0], args[1]), ValueType::F32)
                }
                _ => {
                    let out_ty = if f.scalar_result { ValueType::F32 } else { ty };
                    TypedExpr::new(format!("{}({})", f.name, args.join(", ")), out_ty)
                }
            }
        }
        Expr::Swizzle(inner, swizzle) => {
            let x = lower(inner, env)?;
            if x.ty == ValueType::F32 {
                bail!("cannot swizzle `.{swizzle}` on a scalar");
            }
            let ty = if swizzle.len() == 1 {
                ValueType::F32
            } else {
                ValueType::Vec2
            };
            TypedExpr::new(member(&x.expr, swizzle), ty)
        }
    })
}

/// Parse and lower `src`, reducing a vector result to a scalar.
pub fn compile_scalar_expr(src: &str, env: &ExprEnv) -> Result<TypedExpr> {
    let ast = parse(src)?;
    let out = lower(&ast, env)?;
    Ok(coerce_to_type(&out, ValueType::F32))
}
