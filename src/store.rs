use std::collections::HashMap;

/// Action vocabulary of the external form-state container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreAction {
    SetField { name: String, value: String },
    Clear,
}

/// Injected capability replacing an ambient global form store: the form
/// talks to it through this interface only, never through shared state.
pub trait FormStore {
    fn initialize(&mut self, fields: &[(String, String)]);
    fn dispatch(&mut self, action: StoreAction);
}

#[derive(Default)]
pub struct InMemoryFormStore {
    pub fields: HashMap<String, String>,
}

impl FormStore for InMemoryFormStore {
    fn initialize(&mut self, fields: &[(String, String)]) {
        self.fields = fields.iter().cloned().collect();
    }

    fn dispatch(&mut self, action: StoreAction) {
        match action {
            StoreAction::SetField { name, value } => {
                self.fields.insert(name, value);
            }
            StoreAction::Clear => self.fields.clear(),
        }
    }
}
