use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

use crate::person::Person;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "person")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "person_id")]
    pub id:   Uuid,
    #[sea_orm(column_name = "person_name")]
    pub name: String,
    #[sea_orm(column_name = "person_age")]
    pub age:  i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Person {
    fn from(model: Model) -> Self {
        Person::from_parts(model.id, model.name, model.age)
    }
}

impl From<&Person> for ActiveModel {
    fn from(person: &Person) -> Self {
        ActiveModel {
            id:   Set(person.id()),
            name: Set(person.name().to_string()),
            age:  Set(person.age()),
        }
    }
}
