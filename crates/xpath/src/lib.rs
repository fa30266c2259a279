//! XPath 1.0 queries over caller-supplied trees.
//!
//! Expressions are parsed by a table-driven LL(1) parser (see
//! `treepath-grammar`) into an [`XPathExpr`] and evaluated by walking that
//! tree against any document that implements [`XdmNode`].
//!
//! ```
//! use treepath_xpath::simple_node::{attr, doc, elem};
//! use treepath_xpath::{DynamicContextBuilder, XPathEngine, XdmNode};
//!
//! let document = doc()
//!     .child(
//!         elem("list")
//!             .child(elem("item").attr(attr("id", "a")))
//!             .child(elem("item").attr(attr("id", "b"))),
//!     )
//!     .build();
//!
//! let engine = XPathEngine::new().unwrap();
//! let ctx = DynamicContextBuilder::new().with_context_node(document.clone()).build();
//!
//! let ids = engine.compile("//item[position() = 1]/@id").unwrap().evaluate_nodes(&ctx).unwrap();
//! assert_eq!(ids.len(), 1);
//! assert_eq!(ids.first().and_then(|n| n.value()).as_deref(), Some("a"));
//!
//! let n = engine.compile("2 + 3 * 4").unwrap().evaluate_number(&ctx).unwrap();
//! assert_eq!(n, 14.0);
//! ```

pub mod axes;
pub mod compiler;
pub mod context;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod model;
pub mod parser;
pub mod runtime;
pub mod simple_node;
pub mod xdm;

pub use axes::{Axis, AxisGuide};
pub use compiler::{CompiledXPath, XPathEngine, XPathEngineBuilder, compile, evaluate};
pub use context::{EvaluationContext, Producer};
pub use error::{DefinitionError, DispatchError, Error, EvaluationError};
pub use evaluator::Interpreter;
pub use functions::{FunctionLibrary, FunctionSignature};
pub use model::{NodeKind, QName, XdmNode, try_compare_by_ancestry};
pub use parser::XPathParser;
pub use parser::ast::XPathExpr;
pub use runtime::{DynamicContext, DynamicContextBuilder, Variable};
pub use xdm::{NodeSet, Value, ValueType};
