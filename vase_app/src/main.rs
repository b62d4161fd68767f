//! Demo application: two vases on a floor, a ring of colored point
//! lights and a cubemap skybox.

use nalgebra::Vector3;

use render_engine::assets::ImageData;
use render_engine::core::config::ApplicationConfig;
use render_engine::foundation::time::FrameTimer;
use render_engine::render::mesh::MeshData;
use render_engine::render::vulkan::buffer::Buffer;
use render_engine::render::vulkan::descriptor::{
    DescriptorPool, DescriptorSetLayout, DescriptorWriter,
};
use render_engine::render::vulkan::sync::MAX_FRAMES_IN_FLIGHT;
use render_engine::render::vulkan::texture::Texture;
use render_engine::render::vulkan::{Renderer, VulkanContext, VulkanError, Window};
use render_engine::render::{
    Camera, FrameContext, GeometrySystem, GlobalUbo, Material, Model, PointLightSystem,
    RenderSystem, SkyboxSystem,
};
use render_engine::scene::Scene;

use ash::vk;

const LIGHT_COLORS: [[f32; 3]; 6] = [
    [1.0, 0.1, 0.1],
    [0.1, 0.1, 1.0],
    [0.1, 1.0, 0.1],
    [1.0, 1.0, 0.1],
    [0.1, 1.0, 1.0],
    [1.0, 1.0, 1.0],
];

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("fatal: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = ApplicationConfig::load_or_default("config.toml");

    let mut window = Window::new(
        &config.window.title,
        config.window.width,
        config.window.height,
    )?;
    let context = VulkanContext::new(&mut window, &config.window.title)?;
    let mut renderer = Renderer::new(&context, &window)?;

    // One set per in-flight frame plus the material and skybox sets
    let mut pool = DescriptorPool::new(
        &context,
        MAX_FRAMES_IN_FLIGHT as u32 + 4,
        &[
            (
                vk::DescriptorType::UNIFORM_BUFFER,
                MAX_FRAMES_IN_FLIGHT as u32,
            ),
            (vk::DescriptorType::COMBINED_IMAGE_SAMPLER, 4),
        ],
    )?;

    let global_layout = DescriptorSetLayout::builder()
        .add_binding(
            0,
            vk::DescriptorType::UNIFORM_BUFFER,
            vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
        )?
        .build(&context)?;
    let material_layout = DescriptorSetLayout::builder()
        .add_binding(
            0,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::ShaderStageFlags::FRAGMENT,
        )?
        .build(&context)?;
    let skybox_layout = DescriptorSetLayout::builder()
        .add_binding(
            0,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
            vk::ShaderStageFlags::FRAGMENT,
        )?
        .build(&context)?;

    // One uniform buffer holding a min-offset-aligned slice per in-flight
    // frame, kept mapped for the app's lifetime
    let mut global_ubo = Buffer::new_aligned(
        &context,
        std::mem::size_of::<GlobalUbo>() as vk::DeviceSize,
        MAX_FRAMES_IN_FLIGHT as u32,
        vk::BufferUsageFlags::UNIFORM_BUFFER,
        vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT,
        context.min_uniform_buffer_offset_alignment(),
    )?;
    global_ubo.map()?;

    let mut global_sets = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);
    for slot in 0..MAX_FRAMES_IN_FLIGHT {
        let set = DescriptorWriter::new(&global_layout)
            .write_buffer(0, global_ubo.instance_descriptor_info(slot as u32))
            .build(&context, &mut pool)?;
        global_sets.push(set);
    }

    let mut scene = Scene::new();
    load_scene(&context, &material_layout, &mut pool, &mut scene)?;

    let skybox_texture = load_skybox(&context)?;
    let skybox_set = DescriptorWriter::new(&skybox_layout)
        .write_image(0, skybox_texture.descriptor_info())
        .build(&context, &mut pool)?;

    let shaders = &config.renderer.shaders;
    let systems = vec![
        RenderSystem::Geometry(GeometrySystem::new(
            &context,
            renderer.render_pass(),
            &shaders.geometry_vert,
            &shaders.geometry_frag,
            &[global_layout.handle(), material_layout.handle()],
        )?),
        RenderSystem::Skybox(SkyboxSystem::new(
            &context,
            renderer.render_pass(),
            &shaders.skybox_vert,
            &shaders.skybox_frag,
            &[global_layout.handle(), skybox_layout.handle()],
            skybox_set,
        )?),
        RenderSystem::PointLight(PointLightSystem::new(
            &context,
            renderer.render_pass(),
            &shaders.point_light_vert,
            &shaders.point_light_frag,
            global_layout.handle(),
        )?),
    ];

    let mut camera = Camera::new();
    let mut timer = FrameTimer::new();
    let mut elapsed = 0.0f32;

    while !window.should_close() {
        window.poll_events();
        if window.key_pressed(glfw::Key::Escape) {
            window.set_should_close(true);
        }

        let frame_time = timer.tick();
        elapsed += frame_time;

        // Slowly orbit the light ring
        let angle_step = std::f32::consts::TAU / LIGHT_COLORS.len() as f32;
        let mut light_index = 0;
        for entity in scene.iter_mut() {
            if entity.point_light.is_none() {
                continue;
            }
            let angle = elapsed * 0.5 + angle_step * light_index as f32;
            entity.transform.translation =
                Vector3::new(angle.cos(), -1.0, angle.sin());
            light_index += 1;
        }

        camera.set_view_target(
            Vector3::new(0.0, -1.5, -3.5),
            Vector3::new(0.0, -0.5, 0.0),
            Vector3::new(0.0, -1.0, 0.0),
        );
        camera.set_perspective_projection(
            50.0_f32.to_radians(),
            renderer.aspect_ratio(),
            0.1,
            100.0,
        );

        let frame = match renderer.begin_frame(&context) {
            Ok(frame) => frame,
            Err(VulkanError::SurfaceOutOfDate) => {
                renderer.rebuild_swapchain(&context, &mut window)?;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let mut ubo = GlobalUbo {
            projection: (*camera.projection()).into(),
            view: (*camera.view()).into(),
            inverse_view: (*camera.inverse_view()).into(),
            ..GlobalUbo::default()
        };
        for system in &systems {
            if let RenderSystem::PointLight(point_lights) = system {
                point_lights.update(&scene, &mut ubo)?;
            }
        }
        global_ubo.write_instance(frame.slot_index as u32, &ubo);

        let frame_context = FrameContext {
            frame_index: frame.slot_index,
            frame_time,
            command_buffer: frame.command_buffer,
            camera: &camera,
            global_descriptor_set: global_sets[frame.slot_index],
            scene: &scene,
        };

        renderer.begin_render_pass(&frame);
        for system in &systems {
            system.render(&frame_context);
        }
        renderer.end_render_pass(&frame);

        match renderer.end_frame(&context, frame) {
            Ok(()) => {}
            Err(VulkanError::SurfaceOutOfDate) => {
                renderer.rebuild_swapchain(&context, &mut window)?;
            }
            Err(e) => return Err(e.into()),
        }

        if window.was_resized() {
            renderer.rebuild_swapchain(&context, &mut window)?;
        }
    }

    context.wait_idle()?;
    Ok(())
}

/// Populate the scene: two vases, a floor and the light ring
fn load_scene(
    context: &VulkanContext,
    material_layout: &DescriptorSetLayout,
    pool: &mut DescriptorPool,
    scene: &mut Scene,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut white = Material::new(Texture::new_2d(
        context,
        &ImageData::solid_color(1, 1, [255, 255, 255, 255]).data,
        1,
        1,
    )?);
    white.build_descriptor(context, material_layout, pool)?;
    let white = scene.add_material(white);

    let flat_vase = scene.add_geometry(Model::new(
        context,
        &MeshData::load("models/flat_vase.obj")?,
    )?);
    let smooth_vase = scene.add_geometry(Model::new(
        context,
        &MeshData::load("models/smooth_vase.obj")?,
    )?);
    let floor = scene.add_geometry(Model::new(context, &MeshData::load("models/quad.obj")?)?);

    let vase = scene.create_entity();
    vase.geometry = Some(flat_vase);
    vase.material = Some(white);
    vase.transform.translation = Vector3::new(-0.5, 0.5, 0.0);
    vase.transform.scale = Vector3::new(3.0, 1.5, 3.0);

    let vase = scene.create_entity();
    vase.geometry = Some(smooth_vase);
    vase.material = Some(white);
    vase.transform.translation = Vector3::new(0.5, 0.5, 0.0);
    vase.transform.scale = Vector3::new(3.0, 1.5, 3.0);

    let ground = scene.create_entity();
    ground.geometry = Some(floor);
    ground.material = Some(white);
    ground.transform.translation = Vector3::new(0.0, 0.5, 0.0);
    ground.transform.scale = Vector3::new(3.0, 1.0, 3.0);

    for color in LIGHT_COLORS {
        scene
            .create_entity()
            .make_point_light(0.6, 0.08, Vector3::from(color));
    }

    Ok(())
}

/// Load the six cubemap faces in +X, -X, +Y, -Y, +Z, -Z order
fn load_skybox(context: &VulkanContext) -> Result<Texture, Box<dyn std::error::Error>> {
    let face_names = ["px", "nx", "py", "ny", "pz", "nz"];
    let mut faces: Vec<ImageData> = Vec::with_capacity(6);
    for name in face_names {
        faces.push(ImageData::from_file(format!(
            "textures/skybox/{}.png",
            name
        ))?);
    }

    let (width, height) = (faces[0].width, faces[0].height);
    let pixels: [Vec<u8>; 6] = [
        faces[0].data.clone(),
        faces[1].data.clone(),
        faces[2].data.clone(),
        faces[3].data.clone(),
        faces[4].data.clone(),
        faces[5].data.clone(),
    ];
    Ok(Texture::new_cubemap(context, &pixels, width, height)?)
}
