//! LL(1) grammar compiler and table-driven parser.
//!
//! A [`Grammar`] owns production rules over the symbols of a [`SymbolTable`].
//! FIRST/FOLLOW sets and the [`ParseTable`] are derived on demand; a
//! [`Parser`] then folds each rule's semantic action over a token stream,
//! synthesizing one value (usually an AST root) for the start symbol.
//!
//! ```
//! use treepath_grammar::{Grammar, NamedSymbols, Symbol};
//!
//! let symbols: NamedSymbols = ["EOS", "x", "List"].into_iter().collect();
//! let (eos, x, list) = (Symbol(0), Symbol(1), Symbol(2));
//! let mut g: Grammar<usize> = Grammar::new(symbols, eos).unwrap();
//! g.start(list)
//!     .unwrap()
//!     .produces(&[x, list], |v| Ok(v[1] + 1))
//!     .unwrap()
//!     .produces(&[], |_| Ok(0))
//!     .unwrap();
//! assert!(g.first(list, None).unwrap().epsilon);
//! assert!(g.follow(list).unwrap().contains(&eos));
//! ```

pub mod error;
pub mod grammar;
pub mod parser;
pub mod symbol;
pub mod table;

pub use error::{ActionError, ConflictKind, GrammarError, LexError, ParseError};
pub use grammar::{Action, FirstSet, Grammar, Productions, Rule, RuleDisplay, RuleId};
pub use parser::{Parser, Tokenizer};
pub use symbol::{NamedSymbols, Symbol, SymbolTable};
pub use table::ParseTable;
