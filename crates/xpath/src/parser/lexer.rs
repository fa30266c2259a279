//! Tokenizer for XPath 1.0 expressions.
//!
//! Lexemes are recognised by a pest grammar; the classification that depends
//! on neighbouring tokens (operator names, `*`, function and axis names)
//! happens afterwards, following the lexical rules of XPath 1.0.

use super::grammar::Sem;
use super::symbols::Sym;
use pest::Parser as _;
use pest::error::InputLocation;
use pest_derive::Parser;
use treepath_grammar::{LexError, Symbol, Tokenizer};

#[derive(Parser)]
#[grammar = "parser/xpath1.pest"]
struct LexemeParser;

/// Semantic value carried by a token.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TokenValue {
    #[default]
    None,
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub sym: Sym,
    pub value: TokenValue,
    pub offset: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
enum Raw {
    Number(f64),
    Literal(String),
    Variable(String),
    Name(String),
    Star,
    DoubleColon,
    Punct(Sym),
}

const NODE_TYPES: [&str; 4] = ["comment", "text", "processing-instruction", "node"];

/// Splits `input` into classified tokens, ending with [`Sym::Eos`].
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let pairs = LexemeParser::parse(Rule::lexemes, input).map_err(|e| {
        let offset = match e.location {
            InputLocation::Pos(p) => p,
            InputLocation::Span((p, _)) => p,
        };
        LexError::new(offset, format!("unrecognized input at offset {offset}"))
    })?;

    let mut raw = Vec::new();
    for pair in pairs.flatten() {
        let text = pair.as_str();
        let lexeme = match pair.as_rule() {
            Rule::number => Raw::Number(text.parse().unwrap_or(f64::NAN)),
            Rule::literal => Raw::Literal(text[1..text.len() - 1].to_string()),
            Rule::variable_ref => Raw::Variable(text[1..].to_string()),
            Rule::name => Raw::Name(text.to_string()),
            Rule::star => Raw::Star,
            Rule::double_colon => Raw::DoubleColon,
            Rule::dot_dot => Raw::Punct(Sym::DotDot),
            Rule::dot => Raw::Punct(Sym::Dot),
            Rule::double_slash => Raw::Punct(Sym::DoubleSlash),
            Rule::slash => Raw::Punct(Sym::Slash),
            Rule::not_equal => Raw::Punct(Sym::Neq),
            Rule::less_equal => Raw::Punct(Sym::Lte),
            Rule::greater_equal => Raw::Punct(Sym::Gte),
            Rule::less => Raw::Punct(Sym::Lt),
            Rule::greater => Raw::Punct(Sym::Gt),
            Rule::equal => Raw::Punct(Sym::Eq),
            Rule::left_paren => Raw::Punct(Sym::LeftParen),
            Rule::right_paren => Raw::Punct(Sym::RightParen),
            Rule::left_bracket => Raw::Punct(Sym::LeftBracket),
            Rule::right_bracket => Raw::Punct(Sym::RightBracket),
            Rule::at_sign => Raw::Punct(Sym::AtSign),
            Rule::comma => Raw::Punct(Sym::Comma),
            Rule::pipe => Raw::Punct(Sym::Pipe),
            Rule::plus => Raw::Punct(Sym::Plus),
            Rule::minus => Raw::Punct(Sym::Minus),
            _ => continue,
        };
        raw.push((lexeme, pair.as_span().start(), text.to_string()));
    }
    classify(raw, input.len())
}

fn is_operator(sym: Sym) -> bool {
    matches!(
        sym,
        Sym::And
            | Sym::Or
            | Sym::Mod
            | Sym::Div
            | Sym::Mul
            | Sym::Slash
            | Sym::DoubleSlash
            | Sym::Pipe
            | Sym::Plus
            | Sym::Minus
            | Sym::Eq
            | Sym::Neq
            | Sym::Lt
            | Sym::Lte
            | Sym::Gt
            | Sym::Gte
    )
}

fn operator_name(name: &str) -> Option<Sym> {
    match name {
        "and" => Some(Sym::And),
        "or" => Some(Sym::Or),
        "mod" => Some(Sym::Mod),
        "div" => Some(Sym::Div),
        _ => None,
    }
}

fn classify(raw: Vec<(Raw, usize, String)>, end: usize) -> Result<Vec<Token>, LexError> {
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len() + 1);
    // Operator position: a preceding token exists and is not `@ :: ( [ ,` or an operator.
    let mut after_operand = false;
    let mut iter = raw.into_iter().peekable();

    while let Some((lexeme, offset, text)) = iter.next() {
        let before_paren = matches!(iter.peek(), Some((Raw::Punct(Sym::LeftParen), _, _)));
        let before_axis_separator = matches!(iter.peek(), Some((Raw::DoubleColon, _, _)));
        let (sym, value) = match lexeme {
            Raw::Number(n) => (Sym::Number, TokenValue::Number(n)),
            Raw::Literal(s) => (Sym::Literal, TokenValue::Text(s)),
            Raw::Variable(name) => (Sym::VariableRef, TokenValue::Text(name)),
            Raw::Punct(sym) => (sym, TokenValue::None),
            Raw::DoubleColon => {
                return Err(LexError::new(offset, "'::' must follow an axis name"));
            }
            Raw::Star if after_operand => (Sym::Mul, TokenValue::None),
            Raw::Star => (Sym::NameTest, TokenValue::Text("*".into())),
            Raw::Name(name) => match operator_name(&name) {
                Some(op) if after_operand => (op, TokenValue::None),
                _ if before_paren => {
                    let node_type = NODE_TYPES.contains(&name.as_str());
                    (if node_type { Sym::NodeType } else { Sym::FuncName }, TokenValue::Text(name))
                }
                _ if before_axis_separator => {
                    iter.next();
                    let value = TokenValue::Text(name);
                    tokens.push(Token { sym: Sym::AxisName, value, offset, text });
                    after_operand = false;
                    continue;
                }
                _ => (Sym::NameTest, TokenValue::Text(name)),
            },
        };
        after_operand = !is_operator(sym)
            && !matches!(sym, Sym::AtSign | Sym::LeftParen | Sym::LeftBracket | Sym::Comma);
        tokens.push(Token { sym, value, offset, text });
    }
    tokens.push(Token { sym: Sym::Eos, value: TokenValue::None, offset: end, text: String::new() });
    Ok(tokens)
}

/// Token stream fed to the table-driven parser.
#[derive(Debug)]
pub struct XPathLexer {
    tokens: std::vec::IntoIter<Token>,
    pending: Option<Result<Vec<Token>, LexError>>,
    current: Option<Token>,
}

impl XPathLexer {
    pub fn new(input: &str) -> Self {
        Self { tokens: Vec::new().into_iter(), pending: Some(tokenize(input)), current: None }
    }
}

impl Tokenizer<Sem> for XPathLexer {
    fn next_token(&mut self) -> Result<Symbol, LexError> {
        if let Some(lexed) = self.pending.take() {
            self.tokens = lexed?.into_iter();
        }
        self.current = self.tokens.next();
        Ok(self.current.as_ref().map_or(Sym::Eos, |t| t.sym).symbol())
    }

    fn take_value(&mut self) -> Sem {
        let value = self.current.as_mut().map(|t| std::mem::take(&mut t.value));
        Sem::Token(value.unwrap_or_default())
    }

    fn describe_value(&self) -> Option<String> {
        self.current
            .as_ref()
            .filter(|t| t.sym != Sym::Eos)
            .map(|t| format!("'{}' at offset {}", t.text, t.offset))
    }
}
