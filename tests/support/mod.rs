pub mod localhost;
pub mod site;
