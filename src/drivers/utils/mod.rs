pub mod keyboard_normalizer;
