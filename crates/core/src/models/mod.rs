pub mod booking;
pub mod venue;
