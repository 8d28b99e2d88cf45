//! Executable node implementations (spec §4.2). Each submodule is one node
//! kind produced by [`crate::planner::Planner`]; [`crate::node`] defines
//! the shared `ExecutableNode` contract and evaluation context they all
//! implement against.

pub mod attribute_node;
pub mod call;
pub mod comprehension;
pub mod conditional;
pub mod const_node;
pub mod create_list;
pub mod create_map;
pub mod create_object;
pub mod equality;
pub mod field_exists;
pub mod logical;
pub mod membership;
pub mod observe;
pub mod set_membership;

pub use attribute_node::AttributeNode;
pub use call::CallNode;
pub use comprehension::ComprehensionNode;
pub use conditional::ConditionalNode;
pub use const_node::ConstNode;
pub use create_list::CreateListNode;
pub use create_map::CreateMapNode;
pub use create_object::CreateObjectNode;
pub use equality::{ConstantEqualityNode, EqualityNode};
pub use field_exists::FieldExistsNode;
pub use logical::{LogicalNode, LogicalOp};
pub use membership::InNode;
pub use observe::{ObserveFn, ObserveNode};
pub use set_membership::SetMembershipNode;
