use crate::store::Entry;
use minijinja::value::{StructObject, Value};

impl StructObject for Entry {
    fn get_field(&self, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::from(self.id.get()),
            "date" => Value::from(self.event.date.clone()),
            "title" => Value::from(self.event.title.clone()),
            "time" => match &self.event.time {
                Some(time) => Value::from(time.clone()),
                None => Value::from(()),
            },
            _ => return None,
        };

        Some(value)
    }
}
