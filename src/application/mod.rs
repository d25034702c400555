pub mod transfer_service;
