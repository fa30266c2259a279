use core::fmt;

/// Identifier of a grammar symbol.
///
/// Whether a symbol is a terminal or a non-terminal is not encoded in the id;
/// a symbol is a non-terminal exactly when some rule has it on its left-hand
/// side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol(pub u32);

impl Symbol {
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for Symbol {
    fn from(id: u32) -> Self {
        Symbol(id)
    }
}

/// The set of symbol ids a grammar accepts, with printable names.
pub trait SymbolTable: Send + Sync {
    fn contains(&self, symbol: Symbol) -> bool;

    fn name(&self, symbol: Symbol) -> Option<&str>;
}

/// A symbol table built by interning names in order; the n-th name gets id n.
#[derive(Debug, Clone, Default)]
pub struct NamedSymbols {
    names: Vec<String>,
}

impl NamedSymbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: impl Into<String>) -> Symbol {
        let name = name.into();
        if let Some(pos) = self.names.iter().position(|n| *n == name) {
            return Symbol(pos as u32);
        }
        self.names.push(name);
        Symbol((self.names.len() - 1) as u32)
    }

    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.names.iter().position(|n| n == name).map(|pos| Symbol(pos as u32))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for NamedSymbols {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut table = NamedSymbols::new();
        for name in iter {
            table.intern(name.as_ref());
        }
        table
    }
}

impl SymbolTable for NamedSymbols {
    fn contains(&self, symbol: Symbol) -> bool {
        (symbol.0 as usize) < self.names.len()
    }

    fn name(&self, symbol: Symbol) -> Option<&str> {
        self.names.get(symbol.0 as usize).map(String::as_str)
    }
}
