use crate::identity::{Identity, ServerId, TempId};

#[derive(Debug, Clone, PartialEq)]
pub enum Operation<E> {
    Create { row: TempId, entity: E },
    Update { id: ServerId, entity: E },
    Delete { id: ServerId },
}

impl<E> Operation<E> {
    /// Identity of the working-set row this operation came from.
    pub fn row(&self) -> Identity {
        match self {
            Operation::Create { row, .. } => Identity::Temp(*row),
            Operation::Update { id, .. } | Operation::Delete { id } => Identity::Server(id.clone()),
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Operation::Create { .. } => "create",
            Operation::Update { .. } => "update",
            Operation::Delete { .. } => "delete",
        }
    }

    pub fn entity(&self) -> Option<&E> {
        match self {
            Operation::Create { entity, .. } | Operation::Update { entity, .. } => Some(entity),
            Operation::Delete { .. } => None,
        }
    }
}

/// An operation plus the master temp id it has to wait for, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedOp<E> {
    pub op: Operation<E>,
    pub depends_on: Option<TempId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperationBatch<E> {
    pub collection: String,
    pub ops: Vec<PlannedOp<E>>,
}

impl<E> OperationBatch<E> {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ops: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlannedOp<E>> {
        self.ops.iter()
    }

    pub fn count(&self, verb: &str) -> usize {
        self.ops.iter().filter(|planned| planned.op.verb() == verb).count()
    }

    pub(crate) fn push(&mut self, op: Operation<E>, depends_on: Option<TempId>) {
        self.ops.push(PlannedOp { op, depends_on });
    }
}
