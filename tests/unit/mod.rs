mod common;

mod host;
mod inheritance;
mod lifetime;
mod marshaling;
mod operators;
mod overloads;
mod script_classes;
