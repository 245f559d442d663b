//! End-to-end checks of the discovery engine against loopback services.

mod discovery;
