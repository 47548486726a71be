mod support;

mod images;
mod recipes;
