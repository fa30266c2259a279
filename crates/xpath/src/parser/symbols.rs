//! Terminals and non-terminals of the query grammar.

use treepath_grammar::{Symbol, SymbolTable};

macro_rules! symbols {
    ($($variant:ident => $name:literal,)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        pub enum Sym {
            $($variant,)+
        }

        impl Sym {
            pub const ALL: &'static [Sym] = &[$(Sym::$variant,)+];

            pub fn name(self) -> &'static str {
                match self {
                    $(Sym::$variant => $name,)+
                }
            }
        }
    };
}

symbols! {
    Eos => "EOS",
    Number => "NUMBER",
    LeftParen => "LEFT_PAREN",
    RightParen => "RIGHT_PAREN",
    LeftBracket => "LEFT_BRACKET",
    RightBracket => "RIGHT_BRACKET",
    Dot => "DOT",
    DotDot => "DOT_DOT",
    AtSign => "AT_SIGN",
    Comma => "COMMA",
    Literal => "LITERAL",
    Plus => "OP_ARI_PLUS",
    Minus => "OP_ARI_MINUS",
    Div => "OP_ARI_DIV",
    Mul => "OP_ARI_MUL",
    Mod => "OP_ARI_MOD",
    Eq => "OP_REL_EQ",
    Neq => "OP_REL_NEQ",
    Lt => "OP_REL_LT",
    Gt => "OP_REL_GT",
    Lte => "OP_REL_LTE",
    Gte => "OP_REL_GTE",
    Or => "OP_BOOL_OR",
    And => "OP_BOOL_AND",
    Slash => "OP_PATH_SLASH",
    DoubleSlash => "OP_PATH_DBL_SLASH",
    Pipe => "OP_PATH_UNION",
    NameTest => "NAME_TEST",
    AxisName => "AXIS_NAME",
    VariableRef => "VARIABLE_REF",
    NodeType => "NODE_TYPE",
    FuncName => "FUNC_NAME",

    LocationPath => "LocationPath",
    AbsoluteLocationPath => "AbsoluteLocationPath",
    AbsoluteLocationPathTail => "AbsoluteLocationPathTail",
    RelativeLocationPath => "RelativeLocationPath",
    RelativeLocationPathTail => "RelativeLocationPathTail",
    Step => "Step",
    PredicateList => "PredicateList",
    AxisSpecifier => "AxisSpecifier",
    NodeTest => "NodeTest",
    Predicate => "Predicate",
    Expr => "Expr",
    PrimaryExpr => "PrimaryExpr",
    FunctionCall => "FunctionCall",
    ArgumentList => "ArgumentList",
    ArgumentListTail => "ArgumentListTail",
    UnionExpr => "UnionExpr",
    UnionExprTail => "UnionExprTail",
    PathExpr => "PathExpr",
    PathExprTail => "PathExprTail",
    FilterExpr => "FilterExpr",
    FilterExprTail => "FilterExprTail",
    OrExpr => "OrExpr",
    OrExprTail => "OrExprTail",
    AndExpr => "AndExpr",
    AndExprTail => "AndExprTail",
    EqualityExpr => "EqualityExpr",
    EqualityExprTail => "EqualityExprTail",
    RelationalExpr => "RelationalExpr",
    RelationalExprTail => "RelationalExprTail",
    AdditiveExpr => "AdditiveExpr",
    AdditiveExprTail => "AdditiveExprTail",
    MultiplicativeExpr => "MultiplicativeExpr",
    MultiplicativeExprTail => "MultiplicativeExprTail",
    UnaryExpr => "UnaryExpr",
    S => "S",
}

impl Sym {
    pub const fn symbol(self) -> Symbol {
        Symbol(self as u32)
    }

    pub fn from_symbol(symbol: Symbol) -> Option<Sym> {
        Sym::ALL.get(symbol.0 as usize).copied()
    }

    pub fn is_terminal(self) -> bool {
        (self as u32) < (Sym::LocationPath as u32)
    }
}

impl From<Sym> for Symbol {
    fn from(sym: Sym) -> Self {
        sym.symbol()
    }
}

/// Symbol table of the query grammar.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuerySymbols;

impl SymbolTable for QuerySymbols {
    fn contains(&self, symbol: Symbol) -> bool {
        Sym::from_symbol(symbol).is_some()
    }

    fn name(&self, symbol: Symbol) -> Option<&str> {
        Sym::from_symbol(symbol).map(Sym::name)
    }
}
