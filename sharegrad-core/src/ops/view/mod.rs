pub mod transpose;
