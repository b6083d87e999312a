pub mod floors;
