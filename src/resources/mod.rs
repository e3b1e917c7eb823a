/**
 * This module contains the logic for reading textures from external files and
 * the bind group layouts the loaded textures are exposed through.
 */
pub mod texture;
