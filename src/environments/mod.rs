pub mod gaussian_arm;
