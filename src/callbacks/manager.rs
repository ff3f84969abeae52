use std::sync::Arc;

use parking_lot::RwLock;

use crate::callbacks::error::CallbackError;
use crate::callbacks::processor::Processor;
use crate::config::Config;
use crate::logger::Logger;
use crate::types::Operation;

/// The six callback processors owned by one database handle
pub struct Callbacks {
    create: Processor,
    query: Processor,
    update: Processor,
    delete: Processor,
    row: Processor,
    raw: Processor,
}

impl Callbacks {
    pub fn new(config: Arc<RwLock<Config>>, logger: Arc<dyn Logger>) -> Self {
        let processor = |kind| Processor::new(kind, Arc::clone(&config), Arc::clone(&logger));
        Self {
            create: processor(Operation::Create),
            query: processor(Operation::Query),
            update: processor(Operation::Update),
            delete: processor(Operation::Delete),
            row: processor(Operation::Row),
            raw: processor(Operation::Raw),
        }
    }

    pub fn create(&self) -> &Processor {
        &self.create
    }

    pub fn query(&self) -> &Processor {
        &self.query
    }

    pub fn update(&self) -> &Processor {
        &self.update
    }

    pub fn delete(&self) -> &Processor {
        &self.delete
    }

    pub fn row(&self) -> &Processor {
        &self.row
    }

    pub fn raw(&self) -> &Processor {
        &self.raw
    }

    pub fn processor(&self, kind: Operation) -> &Processor {
        match kind {
            Operation::Create => &self.create,
            Operation::Query => &self.query,
            Operation::Update => &self.update,
            Operation::Delete => &self.delete,
            Operation::Row => &self.row,
            Operation::Raw => &self.raw,
        }
    }

    /// Look up a processor by its operation name (`create`, `query`, ...)
    pub fn get(&self, name: &str) -> Result<&Processor, CallbackError> {
        Ok(self.processor(name.parse()?))
    }

    /// Recompile every processor, e.g. after configuration that match predicates read has changed
    pub fn compile_all(&self) -> Result<(), CallbackError> {
        for kind in Operation::ALL {
            self.processor(kind).compile()?;
        }
        Ok(())
    }
}
